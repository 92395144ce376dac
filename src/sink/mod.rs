//! Reporting capability surface
//!
//! One trait per reporting concern. An execution engine writes to the
//! full surface; a report consumer implements whichever subset it cares
//! about and is skipped for the rest.

use crate::models::{
    CaseMeta, HookPhase, MalformedInput, StepDefinition, StepMatch, StepMeta, StepResult, UnitMeta,
};
use thiserror::Error;

/// Failure raised by a report consumer while handling a call.
///
/// These never abort a run; the replay engine logs them and keeps
/// delivering, and the run is marked as having consumer faults.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O failure in report consumer: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failure in report consumer: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("report consumer failure: {0}")]
    Consumer(String),
}

/// Structural notifications: what a unit contains, in document order.
pub trait StructureSink {
    /// Source location of the unit whose stream follows.
    fn source(&mut self, uri: &str) -> Result<(), SinkError>;

    fn unit_started(&mut self, unit: &UnitMeta) -> Result<(), SinkError>;

    fn case_started(&mut self, case: &CaseMeta) -> Result<(), SinkError>;

    fn step(&mut self, step: &StepMeta) -> Result<(), SinkError>;

    fn case_finished(&mut self, case: &CaseMeta) -> Result<(), SinkError>;

    /// End of this unit's own stream.
    fn unit_finished(&mut self) -> Result<(), SinkError>;
}

/// Execution-result notifications.
pub trait ResultSink {
    fn step_matched(&mut self, matched: &StepMatch) -> Result<(), SinkError>;

    fn step_result(&mut self, result: &StepResult) -> Result<(), SinkError>;

    fn hook_result(&mut self, phase: HookPhase, result: &StepResult) -> Result<(), SinkError>;
}

/// Free-text and binary-attachment notifications.
pub trait OutputSink {
    fn text(&mut self, text: &str) -> Result<(), SinkError>;

    fn attachment(&mut self, media_type: &str, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Step-definition registration notifications.
pub trait StepDefinitionSink {
    fn step_definition(&mut self, definition: &StepDefinition) -> Result<(), SinkError>;
}

/// Malformed-input notifications from document parsing.
pub trait DiagnosticsSink {
    fn malformed_input(&mut self, notice: &MalformedInput) -> Result<(), SinkError>;
}

/// Stream lifecycle notifications.
///
/// Delivered exactly once per run by the finalizer, never per unit.
pub trait LifecycleSink {
    /// All reporting for the run is complete.
    fn stream_done(&mut self) -> Result<(), SinkError>;

    /// Release everything; no call follows this one.
    fn stream_close(&mut self) -> Result<(), SinkError>;
}

/// The full surface an execution engine reports into.
pub trait ReportSink:
    StructureSink + ResultSink + OutputSink + StepDefinitionSink + DiagnosticsSink + LifecycleSink
{
}

impl<T> ReportSink for T where
    T: StructureSink
        + ResultSink
        + OutputSink
        + StepDefinitionSink
        + DiagnosticsSink
        + LifecycleSink
{
}
