//! Data models for the runner
//!
//! This module contains all data structures shared across the application.

mod event;
mod outcome;
mod unit;

pub use event::{
    CaseMeta, HookPhase, MalformedInput, StepDefinition, StepMatch, StepMeta, StepResult,
    StepStatus, UnitMeta,
};
pub use outcome::{OutcomeCell, RunOutcome, UnitOutcome, UnitStatus};
pub use unit::Unit;
