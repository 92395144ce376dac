//! Results storage module
//!
//! Provides persistent storage and export for run summaries.

mod storage;

pub use storage::{EnvironmentInfo, RunRecord, RunStore};
