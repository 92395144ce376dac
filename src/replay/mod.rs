//! Log replay onto the shared consumers
//!
//! Delivers a finished unit's recorded commands to every consumer that
//! supports each command's capability. The consumer-set lock is held
//! for the whole log, so concurrent unit replays never interleave and
//! the shared stream reads as if units ran one after another.

use crate::consumer::{Consumer, ConsumerSet};
use crate::record::{EventCommand, EventLog};
use crate::sink::SinkError;
use tracing::warn;

/// Replay one unit's log onto the consumer set, consuming the log.
///
/// Consumer failures are contained: the failure is logged, the same
/// command still goes to the remaining consumers, and delivery of the
/// rest of the log continues. Returns the number of contained faults.
pub async fn replay(log: EventLog, consumers: &ConsumerSet) -> usize {
    let mut guard = consumers.lock().await;
    let mut faults = 0usize;
    for command in log {
        for consumer in guard.iter_mut() {
            if let Err(err) = deliver(&command, consumer.as_mut()) {
                warn!(
                    "consumer {} failed on {}: {}",
                    consumer.name(),
                    command.name(),
                    err
                );
                faults += 1;
            }
        }
    }
    faults
}

/// Deliver one command to one consumer, skipping capabilities the
/// consumer does not expose.
fn deliver(command: &EventCommand, consumer: &mut dyn Consumer) -> Result<(), SinkError> {
    match command {
        EventCommand::Source { uri } => {
            if let Some(sink) = consumer.structure() {
                sink.source(uri)?;
            }
        }
        EventCommand::UnitStarted { unit } => {
            if let Some(sink) = consumer.structure() {
                sink.unit_started(unit)?;
            }
        }
        EventCommand::CaseStarted { case } => {
            if let Some(sink) = consumer.structure() {
                sink.case_started(case)?;
            }
        }
        EventCommand::Step { step } => {
            if let Some(sink) = consumer.structure() {
                sink.step(step)?;
            }
        }
        EventCommand::CaseFinished { case } => {
            if let Some(sink) = consumer.structure() {
                sink.case_finished(case)?;
            }
        }
        EventCommand::UnitFinished => {
            if let Some(sink) = consumer.structure() {
                sink.unit_finished()?;
            }
        }
        EventCommand::StepMatched { matched } => {
            if let Some(sink) = consumer.results() {
                sink.step_matched(matched)?;
            }
        }
        EventCommand::StepResult { result } => {
            if let Some(sink) = consumer.results() {
                sink.step_result(result)?;
            }
        }
        EventCommand::HookResult { phase, result } => {
            if let Some(sink) = consumer.results() {
                sink.hook_result(*phase, result)?;
            }
        }
        EventCommand::Text { text } => {
            if let Some(sink) = consumer.output() {
                sink.text(text)?;
            }
        }
        EventCommand::Attachment { media_type, bytes } => {
            if let Some(sink) = consumer.output() {
                sink.attachment(media_type, bytes)?;
            }
        }
        EventCommand::StepDefinition { definition } => {
            if let Some(sink) = consumer.step_definitions() {
                sink.step_definition(definition)?;
            }
        }
        EventCommand::MalformedInput { notice } => {
            if let Some(sink) = consumer.diagnostics() {
                sink.malformed_input(notice)?;
            }
        }
    }
    Ok(())
}
