//! Execution engine seam
//!
//! The engine that actually runs a unit's content sits behind this
//! trait. The harness schedules units, records their streams, and
//! replays them; everything content-specific lives on the other side.

mod outline;

pub use outline::OutlineEngine;

use crate::models::{Unit, UnitStatus};
use crate::sink::{ReportSink, SinkError};
use thiserror::Error;

/// Failure raised by an execution engine.
///
/// Raising one means the unit *crashed*; ordinary step failures are
/// reported through the sink and end in an `Ok(UnitStatus::Failed)`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to read unit source: {0}")]
    Io(#[from] std::io::Error),

    #[error("report sink rejected an event: {0}")]
    Sink(#[from] SinkError),

    #[error("{0}")]
    Other(String),
}

/// Execution settings scoped to exactly one unit.
#[derive(Clone, Debug)]
pub struct UnitPlan {
    unit: Unit,
    dry_run: bool,
}

impl UnitPlan {
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            dry_run: false,
        }
    }

    /// Report every step as skipped instead of executing it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// A synchronous single-unit execution engine.
///
/// Engines run on blocking worker threads, one unit per call, and must
/// be shareable across those threads. All reporting goes through the
/// sink passed in; engines hold no reporting state of their own.
pub trait Engine: Send + Sync {
    /// Run one unit and report everything through `sink`.
    ///
    /// `Ok` carries the verdict the unit earned (`Passed` or `Failed`);
    /// `Err` means the engine itself gave out and the caller records
    /// the unit as crashed.
    fn run(&self, plan: &UnitPlan, sink: &mut dyn ReportSink) -> Result<UnitStatus, EngineError>;
}
