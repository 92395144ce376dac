//! Bounded-pool scheduling
//!
//! Submits one task per unit, caps concurrency with a semaphore, and
//! waits for the whole batch or the global deadline, whichever comes
//! first. Replay ordering is not the scheduler's business; that lives
//! entirely behind the consumer-set lock.

use crate::consumer::ConsumerSet;
use crate::engine::Engine;
use crate::executor::runner;
use crate::models::{OutcomeCell, RunOutcome, Unit, UnitOutcome, UnitStatus};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, info, warn};

/// Default number of pool workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Default global deadline for one whole run.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(15 * 60);

/// Scheduler lifecycle, observable for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Submitting,
    AwaitingCompletion,
    Completed,
    TimedOut,
}

/// Runs a batch of units on a bounded worker pool.
pub struct Scheduler {
    engine: Arc<dyn Engine>,
    consumers: Arc<ConsumerSet>,
    workers: usize,
    deadline: Duration,
    dry_run: bool,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(engine: Arc<dyn Engine>, consumers: Arc<ConsumerSet>) -> Self {
        Self {
            engine,
            consumers,
            workers: DEFAULT_WORKERS,
            deadline: DEFAULT_DEADLINE,
            dry_run: false,
            state: SchedulerState::Idle,
        }
    }

    /// Cap on concurrently executing units; at least one.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run every unit to completion or until the deadline expires.
    ///
    /// On timeout the outstanding tasks are aborted: an engine call
    /// already on a blocking thread runs to completion there, but its
    /// log is never replayed. Units already replayed keep their
    /// recorded results and the outcome is marked as timed out.
    pub async fn run(&mut self, units: Vec<Unit>) -> RunOutcome {
        let outcome = Arc::new(OutcomeCell::new());
        let semaphore = Arc::new(Semaphore::new(self.workers));

        self.state = SchedulerState::Submitting;
        info!(
            "running {} unit(s) on {} worker(s), deadline {}s",
            units.len(),
            self.workers,
            self.deadline.as_secs()
        );

        let mut uris = Vec::with_capacity(units.len());
        let mut handles = Vec::with_capacity(units.len());
        for unit in units {
            uris.push(unit.uri());

            let semaphore = semaphore.clone();
            let engine = self.engine.clone();
            let consumers = self.consumers.clone();
            let outcome = outcome.clone();
            let dry_run = self.dry_run;

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();
                debug!("worker picked up {}", unit);
                runner::run_unit(unit, engine, consumers, outcome, dry_run).await;
            }));
        }

        self.state = SchedulerState::AwaitingCompletion;
        debug!("all {} task(s) submitted, awaiting completion", uris.len());

        match time::timeout(self.deadline, join_all(handles.iter_mut())).await {
            Ok(joined) => {
                for (uri, result) in uris.into_iter().zip(joined) {
                    if let Err(err) = result {
                        // the task died outside the runner's containment;
                        // account for the unit anyway
                        warn!("task for {} was lost: {}", uri, err);
                        outcome.record_unit(UnitOutcome::new(uri, UnitStatus::Crashed, 0));
                    }
                }
                self.state = SchedulerState::Completed;
            }
            Err(_) => {
                warn!(
                    "deadline of {}s exceeded; aborting outstanding units",
                    self.deadline.as_secs()
                );
                // a straggler cancelled here can no longer take the
                // consumer lock, so nothing replays after the stream
                // is finalized
                for handle in &handles {
                    handle.abort();
                }
                outcome.mark_timed_out();
                self.state = SchedulerState::TimedOut;
            }
        }

        outcome.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, UnitPlan};
    use crate::models::{CaseMeta, StepMeta, StepResult, UnitMeta};
    use crate::sink::{ReportSink, SinkError, StructureSink};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Engine scripted off unit names: `crash-*` records four commands
    /// then errors, `hang-*` sleeps well past the test deadline,
    /// `fail-*` completes with a failure, everything else passes.
    struct ScriptedEngine {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl ScriptedEngine {
        fn new() -> Self {
            Self {
                in_flight: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Engine for ScriptedEngine {
        fn run(
            &self,
            plan: &UnitPlan,
            sink: &mut dyn ReportSink,
        ) -> Result<UnitStatus, EngineError> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);

            let name = plan.unit().name().to_string();
            let verdict = (|| {
                sink.source(&plan.unit().uri())?;
                sink.unit_started(&UnitMeta::named(&name))?;

                if name.starts_with("crash") {
                    sink.case_started(&CaseMeta::named("partial"))?;
                    sink.step(&StepMeta::new("step", "cut short"))?;
                    return Err(EngineError::Other("engine gave out".to_string()));
                }
                if name.starts_with("hang") {
                    // long enough to outlive the test deadline, short
                    // enough not to stall runtime shutdown
                    std::thread::sleep(Duration::from_millis(1500));
                }

                sink.case_started(&CaseMeta::named("case"))?;
                sink.step(&StepMeta::new("step", "one step"))?;
                sink.step_result(&if name.starts_with("fail") {
                    StepResult::failed(1, "scripted failure")
                } else {
                    StepResult::passed(1)
                })?;
                sink.case_finished(&CaseMeta::named("case"))?;
                sink.unit_finished()?;

                if name.starts_with("fail") {
                    Ok(UnitStatus::Failed)
                } else {
                    Ok(UnitStatus::Passed)
                }
            })();

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            verdict
        }
    }

    /// Structure-only consumer counting whole-log deliveries per uri.
    struct UnitCounter {
        done: Arc<Mutex<Vec<String>>>,
        current: Option<String>,
    }

    impl StructureSink for UnitCounter {
        fn source(&mut self, uri: &str) -> Result<(), SinkError> {
            self.current = Some(uri.to_string());
            Ok(())
        }
        fn unit_started(&mut self, _unit: &UnitMeta) -> Result<(), SinkError> {
            Ok(())
        }
        fn case_started(&mut self, _case: &CaseMeta) -> Result<(), SinkError> {
            Ok(())
        }
        fn step(&mut self, _step: &StepMeta) -> Result<(), SinkError> {
            Ok(())
        }
        fn case_finished(&mut self, _case: &CaseMeta) -> Result<(), SinkError> {
            Ok(())
        }
        fn unit_finished(&mut self) -> Result<(), SinkError> {
            if let Some(uri) = self.current.take() {
                self.done.lock().unwrap().push(uri);
            }
            Ok(())
        }
    }

    impl crate::consumer::Consumer for UnitCounter {
        fn name(&self) -> &'static str {
            "unit-counter"
        }
        fn structure(&mut self) -> Option<&mut dyn StructureSink> {
            Some(self)
        }
    }

    fn units(names: &[&str]) -> Vec<Unit> {
        names
            .iter()
            .map(|n| Unit::from_path(format!("{n}.outline")))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_runs_everything_with_fewer_workers() {
        let engine = Arc::new(ScriptedEngine::new());
        let peak = engine.peak.clone();
        let done = Arc::new(Mutex::new(Vec::new()));
        let consumers = Arc::new(ConsumerSet::new(vec![Box::new(UnitCounter {
            done: done.clone(),
            current: None,
        })]));

        let mut scheduler = Scheduler::new(engine, consumers).workers(2);
        let outcome = scheduler
            .run(units(&["a", "b", "c", "d", "e"]))
            .await;

        assert_eq!(scheduler.state(), SchedulerState::Completed);
        assert_eq!(outcome.total(), 5);
        assert_eq!(outcome.passed(), 5);
        assert!(outcome.success());
        assert!(peak.load(Ordering::SeqCst) <= 2, "pool cap was exceeded");

        let mut finished = done.lock().unwrap().clone();
        finished.sort();
        assert_eq!(
            finished,
            vec!["a.outline", "b.outline", "c.outline", "d.outline", "e.outline"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_crash_mid_batch_leaves_other_units_intact() {
        let engine = Arc::new(ScriptedEngine::new());
        let done = Arc::new(Mutex::new(Vec::new()));
        let consumers = Arc::new(ConsumerSet::new(vec![Box::new(UnitCounter {
            done: done.clone(),
            current: None,
        })]));

        let mut scheduler = Scheduler::new(engine, consumers).workers(2);
        let outcome = scheduler.run(units(&["a", "crash-b", "c"])).await;

        assert_eq!(outcome.total(), 3);
        assert_eq!(outcome.passed(), 2);
        assert_eq!(outcome.crashed(), 1);
        assert!(!outcome.success());
        assert_eq!(outcome.exit_code(), 1);

        // the crashed unit never reached unit_finished, the others did
        let finished = done.lock().unwrap().clone();
        assert_eq!(finished.len(), 2);
        assert!(!finished.contains(&"crash-b.outline".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deadline_abandons_outstanding_units() {
        let engine = Arc::new(ScriptedEngine::new());
        let done = Arc::new(Mutex::new(Vec::new()));
        let consumers = Arc::new(ConsumerSet::new(vec![Box::new(UnitCounter {
            done: done.clone(),
            current: None,
        })]));

        let mut scheduler = Scheduler::new(engine, consumers)
            .workers(2)
            .deadline(Duration::from_millis(200));
        let outcome = scheduler.run(units(&["fast", "hang-slow"])).await;

        assert_eq!(scheduler.state(), SchedulerState::TimedOut);
        assert!(outcome.timed_out);
        assert!(!outcome.success());
        assert_eq!(outcome.exit_code(), 1);

        // the fast unit completed and was replayed before the deadline
        assert_eq!(outcome.total(), 1);
        assert_eq!(outcome.units[0].unit, "fast.outline");
        assert!(done.lock().unwrap().contains(&"fast.outline".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_timed_out_units_never_report_late() {
        let engine = Arc::new(ScriptedEngine::new());
        let done = Arc::new(Mutex::new(Vec::new()));
        let consumers = Arc::new(ConsumerSet::new(vec![Box::new(UnitCounter {
            done: done.clone(),
            current: None,
        })]));

        let mut scheduler = Scheduler::new(engine, consumers)
            .workers(2)
            .deadline(Duration::from_millis(200));
        let outcome = scheduler.run(units(&["hang-a"])).await;
        assert!(outcome.timed_out);

        // the hung engine finishes on its blocking thread well after
        // the deadline; the aborted task must not replay its log then
        time::sleep(Duration::from_millis(1800)).await;
        assert!(done.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_completes_cleanly() {
        let engine = Arc::new(ScriptedEngine::new());
        let consumers = Arc::new(ConsumerSet::new(Vec::new()));

        let mut scheduler = Scheduler::new(engine, consumers);
        let outcome = scheduler.run(Vec::new()).await;

        assert_eq!(scheduler.state(), SchedulerState::Completed);
        assert_eq!(outcome.total(), 0);
        assert!(outcome.success());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_workers_floor_is_one() {
        let engine: Arc<dyn Engine> = Arc::new(ScriptedEngine::new());
        let consumers = Arc::new(ConsumerSet::new(Vec::new()));
        let scheduler = Scheduler::new(engine, consumers).workers(0);
        assert_eq!(scheduler.workers, 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }
}
