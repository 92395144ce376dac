//! Unit handles
//!
//! A unit is one independently executable feature document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque handle to one feature document.
///
/// The harness schedules, records, and replays units; it never looks
/// inside them. Content is entirely the execution engine's business.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    path: PathBuf,
    name: String,
}

impl Unit {
    /// Create a unit handle from a document path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// Document path as given.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short display name (the file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier used in the reporting stream.
    pub fn uri(&self) -> String {
        self.path.display().to_string()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
