//! Reporting event payloads
//!
//! The argument types carried by reporting calls. Each is an owned,
//! cloneable value so a recorded call can be replayed any number of
//! times without touching engine state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declaration of a unit at the start of its stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMeta {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl UnitMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Declaration of one case inside a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMeta {
    pub name: String,
    pub tags: Vec<String>,
    pub line: u32,
}

impl CaseMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            line: 0,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

/// One step of a case, as declared in the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMeta {
    pub keyword: String,
    pub text: String,
    pub line: u32,
}

impl StepMeta {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
            line: 0,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

/// Where a step matched a definition, if it matched at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMatch {
    pub location: Option<String>,
}

impl StepMatch {
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
        }
    }

    pub fn unmatched() -> Self {
        Self { location: None }
    }
}

/// Outcome of executing one step or hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
    Pending,
    Undefined,
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Passed | StepStatus::Skipped)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            StepStatus::Passed => "✓",
            StepStatus::Failed => "✗",
            StepStatus::Skipped => "○",
            StepStatus::Pending => "?",
            StepStatus::Undefined => "!",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::Pending => "pending",
            StepStatus::Undefined => "undefined",
        };
        write!(f, "{s}")
    }
}

/// Result of executing one step (or hook).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

impl StepResult {
    pub fn passed(duration_ms: u64) -> Self {
        Self {
            status: StepStatus::Passed,
            duration_ms: Some(duration_ms),
            error: None,
        }
    }

    pub fn failed(duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            duration_ms: Some(duration_ms),
            error: Some(error.into()),
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: StepStatus::Skipped,
            duration_ms: None,
            error: None,
        }
    }

    pub fn pending() -> Self {
        Self {
            status: StepStatus::Pending,
            duration_ms: None,
            error: None,
        }
    }

    pub fn undefined() -> Self {
        Self {
            status: StepStatus::Undefined,
            duration_ms: None,
            error: None,
        }
    }
}

/// Which side of a case a hook ran on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookPhase {
    Before,
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Before => write!(f, "before"),
            HookPhase::After => write!(f, "after"),
        }
    }
}

/// A step definition known to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub pattern: String,
    pub location: String,
}

impl StepDefinition {
    pub fn new(pattern: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            location: location.into(),
        }
    }
}

/// A malformed-input notice raised while reading a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedInput {
    pub uri: String,
    pub line: Option<u32>,
    pub message: String,
}

impl MalformedInput {
    pub fn new(uri: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            line: Some(line),
            message: message.into(),
        }
    }
}

impl fmt::Display for MalformedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.uri, line, self.message),
            None => write!(f, "{}: {}", self.uri, self.message),
        }
    }
}
