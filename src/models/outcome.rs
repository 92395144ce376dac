//! Run outcomes
//!
//! Per-unit verdicts, the aggregated outcome of a whole run, and the
//! shared cell worker tasks fold their results into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Terminal status of one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Every reported step succeeded.
    Passed,
    /// The unit ran to completion and reported at least one failure.
    Failed,
    /// The engine raised an error or panicked mid-unit.
    Crashed,
}

impl UnitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, UnitStatus::Passed)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnitStatus::Passed => "✓",
            UnitStatus::Failed => "✗",
            UnitStatus::Crashed => "!",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitStatus::Passed => "passed",
            UnitStatus::Failed => "failed",
            UnitStatus::Crashed => "crashed",
        };
        write!(f, "{s}")
    }
}

/// Verdict and timing for one completed unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub unit: String,
    pub status: UnitStatus,
    pub duration_ms: u64,
}

impl UnitOutcome {
    pub fn new(unit: impl Into<String>, status: UnitStatus, duration_ms: u64) -> Self {
        Self {
            unit: unit.into(),
            status,
            duration_ms,
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.unit,
            self.duration_ms
        )
    }
}

/// Aggregated outcome of one whole run.
///
/// A run succeeds only when every unit passed, no consumer faulted, and
/// the deadline was not hit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub units: Vec<UnitOutcome>,
    pub consumer_faults: usize,
    pub timed_out: bool,
}

impl RunOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.units.len()
    }

    pub fn passed(&self) -> usize {
        self.count(UnitStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(UnitStatus::Failed)
    }

    pub fn crashed(&self) -> usize {
        self.count(UnitStatus::Crashed)
    }

    fn count(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|u| u.status == status).count()
    }

    pub fn success(&self) -> bool {
        !self.timed_out
            && self.consumer_faults == 0
            && self.units.iter().all(|u| u.status.is_success())
    }

    /// Process exit code: zero on success, one otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "━".repeat(60))?;
        for unit in &self.units {
            writeln!(f, "  {unit}")?;
        }
        writeln!(f, "{}", "━".repeat(60))?;
        write!(
            f,
            "Total: {} | Passed: {} | Failed: {} | Crashed: {}",
            self.total(),
            self.passed(),
            self.failed(),
            self.crashed()
        )?;
        if self.consumer_faults > 0 {
            write!(f, "\nConsumer faults: {}", self.consumer_faults)?;
        }
        if self.timed_out {
            write!(f, "\nDeadline exceeded; outstanding units were abandoned")?;
        }
        Ok(())
    }
}

/// Shared accumulator for a run in flight.
///
/// Worker tasks and the finalizer all write through one mutex, so the
/// snapshot taken at the end is internally consistent.
#[derive(Debug, Default)]
pub struct OutcomeCell {
    inner: Mutex<RunOutcome>,
}

impl OutcomeCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unit(&self, outcome: UnitOutcome) {
        self.inner.lock().expect("outcome lock").units.push(outcome);
    }

    pub fn record_consumer_faults(&self, faults: usize) {
        self.inner.lock().expect("outcome lock").consumer_faults += faults;
    }

    pub fn mark_timed_out(&self) {
        self.inner.lock().expect("outcome lock").timed_out = true;
    }

    pub fn snapshot(&self) -> RunOutcome {
        self.inner.lock().expect("outcome lock").clone()
    }
}
