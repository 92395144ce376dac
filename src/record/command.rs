//! Recorded reporting commands
//!
//! One immutable command per reporting call. Commands live in memory
//! only for the lifetime of a run; they are never serialized.

use crate::models::{
    CaseMeta, HookPhase, MalformedInput, StepDefinition, StepMatch, StepMeta, StepResult, UnitMeta,
};

/// One recorded reporting call: the call it stands for plus owned
/// copies of its arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum EventCommand {
    Source { uri: String },
    UnitStarted { unit: UnitMeta },
    CaseStarted { case: CaseMeta },
    Step { step: StepMeta },
    CaseFinished { case: CaseMeta },
    UnitFinished,
    StepMatched { matched: StepMatch },
    StepResult { result: StepResult },
    HookResult { phase: HookPhase, result: StepResult },
    Text { text: String },
    Attachment { media_type: String, bytes: Vec<u8> },
    StepDefinition { definition: StepDefinition },
    MalformedInput { notice: MalformedInput },
}

impl EventCommand {
    /// Stable call name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            EventCommand::Source { .. } => "source",
            EventCommand::UnitStarted { .. } => "unit_started",
            EventCommand::CaseStarted { .. } => "case_started",
            EventCommand::Step { .. } => "step",
            EventCommand::CaseFinished { .. } => "case_finished",
            EventCommand::UnitFinished => "unit_finished",
            EventCommand::StepMatched { .. } => "step_matched",
            EventCommand::StepResult { .. } => "step_result",
            EventCommand::HookResult { .. } => "hook_result",
            EventCommand::Text { .. } => "text",
            EventCommand::Attachment { .. } => "attachment",
            EventCommand::StepDefinition { .. } => "step_definition",
            EventCommand::MalformedInput { .. } => "malformed_input",
        }
    }
}

/// The ordered command log produced by running one unit.
///
/// Append-only while the unit records into it; afterwards it is moved
/// into replay and consumed exactly once.
#[derive(Debug, Default, PartialEq)]
pub struct EventLog {
    commands: Vec<EventCommand>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, command: EventCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[EventCommand] {
        &self.commands
    }
}

impl IntoIterator for EventLog {
    type Item = EventCommand;
    type IntoIter = std::vec::IntoIter<EventCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}
