//! Report consumers
//!
//! The shared, process-lifetime consumers that receive the replayed
//! stream, and the set that serializes access to them.

use crate::sink::{
    DiagnosticsSink, LifecycleSink, OutputSink, ResultSink, StepDefinitionSink, StructureSink,
};
use tokio::sync::{Mutex, MutexGuard};

/// A report consumer implementing any subset of the reporting
/// capabilities.
///
/// Each query returns `Some` for the capabilities the consumer
/// supports; the replay engine silently skips it for everything else.
/// The defaults opt out of everything, so a consumer only overrides
/// what it handles.
pub trait Consumer: Send {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    fn structure(&mut self) -> Option<&mut dyn StructureSink> {
        None
    }

    fn results(&mut self) -> Option<&mut dyn ResultSink> {
        None
    }

    fn output(&mut self) -> Option<&mut dyn OutputSink> {
        None
    }

    fn step_definitions(&mut self) -> Option<&mut dyn StepDefinitionSink> {
        None
    }

    fn diagnostics(&mut self) -> Option<&mut dyn DiagnosticsSink> {
        None
    }

    fn lifecycle(&mut self) -> Option<&mut dyn LifecycleSink> {
        None
    }
}

/// The ordered, shared set of real report consumers.
///
/// The mutex around the set is the serialization point for the whole
/// reporting stream: a unit's log is delivered while the guard is held,
/// so two units' replays can never interleave, and every consumer sees
/// units in the same order.
pub struct ConsumerSet {
    consumers: Mutex<Vec<Box<dyn Consumer>>>,
}

impl ConsumerSet {
    pub fn new(consumers: Vec<Box<dyn Consumer>>) -> Self {
        Self {
            consumers: Mutex::new(consumers),
        }
    }

    /// Take exclusive hold of the consumers for one replay or for
    /// finalization.
    pub async fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn Consumer>>> {
        self.consumers.lock().await
    }
}
