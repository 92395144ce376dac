//! Batch execution
//!
//! Bounded-pool scheduling of units, per-unit record-then-replay, and
//! end-of-run stream finalization.

mod finalizer;
mod runner;
mod scheduler;

pub use finalizer::{finalize, finish_stream};
pub use runner::run_unit;
pub use scheduler::{Scheduler, SchedulerState, DEFAULT_DEADLINE, DEFAULT_WORKERS};
