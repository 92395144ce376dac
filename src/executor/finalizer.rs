//! Stream finalization
//!
//! Ends the shared reporting stream exactly once per run and settles
//! the final outcome. Units never close the stream themselves; their
//! lifecycle calls are swallowed at recording time.

use crate::consumer::ConsumerSet;
use crate::models::RunOutcome;
use tracing::{info, warn};

/// Close the shared stream: `stream_done` then `stream_close`, once per
/// consumer that exposes the lifecycle capability, in set order.
///
/// Failures are contained per consumer; the rest still get closed.
/// Returns the number of contained faults.
pub async fn finish_stream(consumers: &ConsumerSet) -> usize {
    let mut guard = consumers.lock().await;
    let mut faults = 0usize;
    for consumer in guard.iter_mut() {
        let name = consumer.name();
        if let Some(sink) = consumer.lifecycle() {
            if let Err(err) = sink.stream_done() {
                warn!("consumer {} failed on stream_done: {}", name, err);
                faults += 1;
            }
            if let Err(err) = sink.stream_close() {
                warn!("consumer {} failed on stream_close: {}", name, err);
                faults += 1;
            }
        }
    }
    faults
}

/// Finish the run: close the stream, fold any late consumer faults into
/// the outcome, and log the verdict.
pub async fn finalize(consumers: &ConsumerSet, mut outcome: RunOutcome) -> RunOutcome {
    let faults = finish_stream(consumers).await;
    outcome.consumer_faults += faults;

    if outcome.success() {
        info!("run passed: {} unit(s)", outcome.total());
    } else {
        warn!(
            "run failed: {} passed, {} failed, {} crashed, {} consumer fault(s){}",
            outcome.passed(),
            outcome.failed(),
            outcome.crashed(),
            outcome.consumer_faults,
            if outcome.timed_out {
                ", deadline exceeded"
            } else {
                ""
            }
        );
    }

    outcome
}
