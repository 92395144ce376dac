//! The recording sink
//!
//! Implements the whole reporting surface by appending commands to a
//! private log. Each unit gets a fresh one, so recording needs no
//! locking at all.

use super::{EventCommand, EventLog};
use crate::models::{
    CaseMeta, HookPhase, MalformedInput, StepDefinition, StepMatch, StepMeta, StepResult, UnitMeta,
};
use crate::sink::{
    DiagnosticsSink, LifecycleSink, OutputSink, ResultSink, SinkError, StepDefinitionSink,
    StructureSink,
};

/// Private per-unit recorder. Never fails: recording is an in-memory
/// append.
#[derive(Debug, Default)]
pub struct RecordingSink {
    log: EventLog,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Surrender the recorded log for replay.
    pub fn into_log(self) -> EventLog {
        self.log
    }
}

impl StructureSink for RecordingSink {
    fn source(&mut self, uri: &str) -> Result<(), SinkError> {
        self.log.push(EventCommand::Source {
            uri: uri.to_string(),
        });
        Ok(())
    }

    fn unit_started(&mut self, unit: &UnitMeta) -> Result<(), SinkError> {
        self.log.push(EventCommand::UnitStarted { unit: unit.clone() });
        Ok(())
    }

    fn case_started(&mut self, case: &CaseMeta) -> Result<(), SinkError> {
        self.log.push(EventCommand::CaseStarted { case: case.clone() });
        Ok(())
    }

    fn step(&mut self, step: &StepMeta) -> Result<(), SinkError> {
        self.log.push(EventCommand::Step { step: step.clone() });
        Ok(())
    }

    fn case_finished(&mut self, case: &CaseMeta) -> Result<(), SinkError> {
        self.log.push(EventCommand::CaseFinished { case: case.clone() });
        Ok(())
    }

    fn unit_finished(&mut self) -> Result<(), SinkError> {
        self.log.push(EventCommand::UnitFinished);
        Ok(())
    }
}

impl ResultSink for RecordingSink {
    fn step_matched(&mut self, matched: &StepMatch) -> Result<(), SinkError> {
        self.log.push(EventCommand::StepMatched {
            matched: matched.clone(),
        });
        Ok(())
    }

    fn step_result(&mut self, result: &StepResult) -> Result<(), SinkError> {
        self.log.push(EventCommand::StepResult {
            result: result.clone(),
        });
        Ok(())
    }

    fn hook_result(&mut self, phase: HookPhase, result: &StepResult) -> Result<(), SinkError> {
        self.log.push(EventCommand::HookResult {
            phase,
            result: result.clone(),
        });
        Ok(())
    }
}

impl OutputSink for RecordingSink {
    fn text(&mut self, text: &str) -> Result<(), SinkError> {
        self.log.push(EventCommand::Text {
            text: text.to_string(),
        });
        Ok(())
    }

    fn attachment(&mut self, media_type: &str, bytes: &[u8]) -> Result<(), SinkError> {
        // deep copy: the engine may reuse its buffer after the call
        self.log.push(EventCommand::Attachment {
            media_type: media_type.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }
}

impl StepDefinitionSink for RecordingSink {
    fn step_definition(&mut self, definition: &StepDefinition) -> Result<(), SinkError> {
        self.log.push(EventCommand::StepDefinition {
            definition: definition.clone(),
        });
        Ok(())
    }
}

impl DiagnosticsSink for RecordingSink {
    fn malformed_input(&mut self, notice: &MalformedInput) -> Result<(), SinkError> {
        self.log.push(EventCommand::MalformedInput {
            notice: notice.clone(),
        });
        Ok(())
    }
}

impl LifecycleSink for RecordingSink {
    /// Swallowed: the shared stream's lifecycle belongs to the
    /// finalizer, not to any single unit.
    fn stream_done(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn stream_close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
