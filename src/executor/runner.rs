//! Single-unit execution
//!
//! Runs one unit against a fresh recording sink on a blocking worker
//! thread, then replays whatever was recorded. Engine errors and
//! panics are contained here: the partial log still reaches the
//! consumers and the unit goes into the outcome as crashed.

use crate::consumer::ConsumerSet;
use crate::engine::{Engine, UnitPlan};
use crate::models::{OutcomeCell, Unit, UnitOutcome, UnitStatus};
use crate::record::RecordingSink;
use crate::replay;
use crate::utils::Timer;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error};

/// Run one unit end to end: execute and record privately, then replay
/// the log onto the shared consumers.
pub async fn run_unit(
    unit: Unit,
    engine: Arc<dyn Engine>,
    consumers: Arc<ConsumerSet>,
    outcome: Arc<OutcomeCell>,
    dry_run: bool,
) {
    let timer = Timer::start(unit.name());
    debug!("unit {} starting", unit);

    let plan_unit = unit.clone();
    let joined = task::spawn_blocking(move || {
        let plan = UnitPlan::new(plan_unit).dry_run(dry_run);
        let mut sink = RecordingSink::new();
        // catch the unwind inside the closure so a panicking engine
        // still surrenders its partial log
        let verdict = panic::catch_unwind(AssertUnwindSafe(|| engine.run(&plan, &mut sink)));
        (sink.into_log(), verdict)
    })
    .await;

    let (log, verdict) = match joined {
        Ok(pair) => pair,
        Err(err) => {
            // the worker itself was lost; there is no log to replay
            error!("unit {} worker was lost: {}", unit, err);
            outcome.record_unit(UnitOutcome::new(
                unit.uri(),
                UnitStatus::Crashed,
                timer.elapsed_ms(),
            ));
            return;
        }
    };

    let duration_ms = timer.elapsed_ms();
    let status = match verdict {
        Ok(Ok(status)) => status,
        Ok(Err(err)) => {
            error!("unit {} crashed: {:#}", unit, err);
            UnitStatus::Crashed
        }
        Err(payload) => {
            error!("unit {} panicked: {}", unit, panic_message(payload.as_ref()));
            UnitStatus::Crashed
        }
    };

    debug!(
        "unit {} finished as {} with {} recorded command(s)",
        unit,
        status,
        log.len()
    );

    let faults = replay::replay(log, &consumers).await;
    if faults > 0 {
        outcome.record_consumer_faults(faults);
    }
    outcome.record_unit(UnitOutcome::new(unit.uri(), status, duration_ms));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use crate::models::{CaseMeta, StepMeta, StepResult, UnitMeta};
    use crate::sink::{ReportSink, SinkError, StructureSink};
    use std::sync::Mutex;

    /// Scripted engine whose behavior is keyed off the unit name.
    struct ScriptedEngine;

    impl Engine for ScriptedEngine {
        fn run(
            &self,
            plan: &UnitPlan,
            sink: &mut dyn ReportSink,
        ) -> Result<UnitStatus, EngineError> {
            let name = plan.unit().name().to_string();
            sink.source(&plan.unit().uri())?;
            sink.unit_started(&UnitMeta::named(&name))?;

            if name.starts_with("crash") {
                // two more commands, four total, then give out
                sink.case_started(&CaseMeta::named("partial"))?;
                sink.step(&StepMeta::new("step", "never finishes"))?;
                return Err(EngineError::Other("engine gave out".to_string()));
            }
            if name.starts_with("panic") {
                sink.case_started(&CaseMeta::named("partial"))?;
                panic!("engine exploded");
            }

            sink.case_started(&CaseMeta::named("whole"))?;
            sink.step(&StepMeta::new("step", "runs fine"))?;
            sink.step_result(&StepResult::passed(1))?;
            sink.case_finished(&CaseMeta::named("whole"))?;
            sink.unit_finished()?;
            if name.starts_with("bad") {
                return Ok(UnitStatus::Failed);
            }
            Ok(UnitStatus::Passed)
        }
    }

    /// Counts structural deliveries per unit uri.
    struct CallCounter {
        per_unit: Arc<Mutex<Vec<(String, usize)>>>,
        current: Option<usize>,
    }

    impl CallCounter {
        fn new(per_unit: Arc<Mutex<Vec<(String, usize)>>>) -> Self {
            Self {
                per_unit,
                current: None,
            }
        }

        fn bump(&mut self) -> Result<(), SinkError> {
            if let Some(idx) = self.current {
                self.per_unit.lock().unwrap()[idx].1 += 1;
            }
            Ok(())
        }
    }

    impl StructureSink for CallCounter {
        fn source(&mut self, uri: &str) -> Result<(), SinkError> {
            let mut per_unit = self.per_unit.lock().unwrap();
            per_unit.push((uri.to_string(), 1));
            self.current = Some(per_unit.len() - 1);
            Ok(())
        }
        fn unit_started(&mut self, _unit: &UnitMeta) -> Result<(), SinkError> {
            self.bump()
        }
        fn case_started(&mut self, _case: &CaseMeta) -> Result<(), SinkError> {
            self.bump()
        }
        fn step(&mut self, _step: &StepMeta) -> Result<(), SinkError> {
            self.bump()
        }
        fn case_finished(&mut self, _case: &CaseMeta) -> Result<(), SinkError> {
            self.bump()
        }
        fn unit_finished(&mut self) -> Result<(), SinkError> {
            self.bump()
        }
    }

    impl crate::consumer::Consumer for CallCounter {
        fn name(&self) -> &'static str {
            "call-counter"
        }
        fn structure(&mut self) -> Option<&mut dyn StructureSink> {
            Some(self)
        }
    }

    fn fixture(
        counts: &Arc<Mutex<Vec<(String, usize)>>>,
    ) -> (Arc<dyn Engine>, Arc<ConsumerSet>, Arc<OutcomeCell>) {
        (
            Arc::new(ScriptedEngine),
            Arc::new(ConsumerSet::new(vec![Box::new(CallCounter::new(
                counts.clone(),
            ))])),
            Arc::new(OutcomeCell::new()),
        )
    }

    #[tokio::test]
    async fn test_passing_unit_is_recorded_and_replayed() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let (engine, consumers, outcome) = fixture(&counts);

        run_unit(
            Unit::from_path("good.outline"),
            engine,
            consumers,
            outcome.clone(),
            false,
        )
        .await;

        let snapshot = outcome.snapshot();
        assert_eq!(snapshot.total(), 1);
        assert_eq!(snapshot.units[0].status, UnitStatus::Passed);
        assert_eq!(snapshot.units[0].unit, "good.outline");

        // structural commands: source, unit_started, case_started, step,
        // case_finished, unit_finished
        let seen = counts.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("good.outline".to_string(), 6));
    }

    #[tokio::test]
    async fn test_crashing_engine_still_replays_partial_log() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let (engine, consumers, outcome) = fixture(&counts);

        run_unit(
            Unit::from_path("crash.outline"),
            engine,
            consumers,
            outcome.clone(),
            false,
        )
        .await;

        let snapshot = outcome.snapshot();
        assert_eq!(snapshot.units[0].status, UnitStatus::Crashed);
        assert!(!snapshot.success());

        // exactly the four commands recorded before the engine gave out
        let seen = counts.lock().unwrap();
        assert_eq!(seen[0], ("crash.outline".to_string(), 4));
    }

    #[tokio::test]
    async fn test_panicking_engine_is_contained() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let (engine, consumers, outcome) = fixture(&counts);

        run_unit(
            Unit::from_path("panic.outline"),
            engine,
            consumers,
            outcome.clone(),
            false,
        )
        .await;

        let snapshot = outcome.snapshot();
        assert_eq!(snapshot.units[0].status, UnitStatus::Crashed);

        // source, unit_started, case_started made it into the log
        let seen = counts.lock().unwrap();
        assert_eq!(seen[0], ("panic.outline".to_string(), 3));
    }

    #[tokio::test]
    async fn test_failed_unit_keeps_failed_status() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let (engine, consumers, outcome) = fixture(&counts);

        run_unit(
            Unit::from_path("bad.outline"),
            engine,
            consumers,
            outcome.clone(),
            false,
        )
        .await;

        let snapshot = outcome.snapshot();
        assert_eq!(snapshot.units[0].status, UnitStatus::Failed);
        assert_eq!(snapshot.exit_code(), 1);
    }
}
