//! Timeout supervision
//!
//! Runs in the grading process next to a worker. Heartbeats from the worker
//! arm and disarm a single deadline; on each polling tick an expired
//! deadline gets the worker killed. There is no cooperative cancellation:
//! a test stuck in a loop or in native code is only stopped by terminating
//! the whole worker.

use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use crate::error::GradeError;
use crate::models::{Heartbeat, WorkerMessage};
use crate::output::Reporter;

/// How long to wait for buffered messages once the worker has exited
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How a worker ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    Success,
    Failure(String),
}

/// Handle on a running worker
#[allow(async_fn_in_trait)]
pub trait Worker {
    /// Non-blocking check whether the worker has exited
    fn has_exited(&mut self) -> Result<Option<WorkerExit>>;

    /// Forcibly stop the worker and reap it
    async fn terminate(&mut self) -> Result<()>;
}

/// Deadline tracking state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Timing {
    Idle,
    Armed {
        /// `None` when the timeout reaches past what `Instant` can represent
        deadline: Option<Instant>,
        description: String,
        timeout: Duration,
    },
}

impl Timing {
    /// Apply a heartbeat received at `now`. A start while armed replaces the
    /// current deadline.
    pub fn apply(&mut self, heartbeat: Heartbeat, now: Instant) {
        *self = match heartbeat {
            Heartbeat::Stop => Timing::Idle,
            Heartbeat::Start {
                description,
                timeout,
            } => Timing::Armed {
                deadline: now.checked_add(timeout),
                description,
                timeout,
            },
        };
    }

    /// The timeout error if the deadline has passed at `now`
    pub fn expired(&self, now: Instant) -> Option<GradeError> {
        match self {
            Timing::Armed {
                deadline,
                description,
                timeout,
            } if deadline.is_some_and(|deadline| now >= deadline) => Some(GradeError::Timeout {
                description: description.clone(),
                timeout: *timeout,
            }),
            _ => None,
        }
    }
}

/// Enforces per-test deadlines on a worker
#[derive(Clone, Debug)]
pub struct Supervisor {
    poll_interval: Duration,
}

impl Supervisor {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Watch `worker` until it exits or a test overruns its timeout.
    ///
    /// Report events are forwarded to `reporter` in the order received.
    /// Errors produced here (timeout, abnormal exit) are reported before
    /// being returned.
    pub async fn supervise<W, R>(
        &self,
        worker: &mut W,
        messages: &mut UnboundedReceiver<WorkerMessage>,
        reporter: &mut R,
    ) -> Result<(), GradeError>
    where
        W: Worker,
        R: Reporter + ?Sized,
    {
        let mut timing = Timing::Idle;
        let mut channel_open = true;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                message = messages.recv(), if channel_open => match message {
                    Some(message) => handle(message, &mut timing, reporter),
                    None => {
                        debug!("Worker channel closed");
                        channel_open = false;
                    }
                },

                _ = ticker.tick() => {
                    if let Some(err) = timing.expired(Instant::now()) {
                        error!("{}", err);
                        reporter.display_error(&err.to_string());
                        if let Err(e) = worker.terminate().await {
                            warn!("Failed to terminate worker: {:#}", e);
                        }
                        return Err(err);
                    }

                    let exit = match worker.has_exited() {
                        Ok(exit) => exit,
                        Err(e) => Some(WorkerExit::Failure(format!("{e:#}"))),
                    };

                    if let Some(exit) = exit {
                        drain(messages, &mut timing, reporter).await;
                        return match exit {
                            WorkerExit::Success => Ok(()),
                            WorkerExit::Failure(status) => {
                                let err = GradeError::WorkerExited(status);
                                error!("{}", err);
                                reporter.display_error(&err.to_string());
                                Err(err)
                            }
                        };
                    }
                }
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

fn handle<R: Reporter + ?Sized>(message: WorkerMessage, timing: &mut Timing, reporter: &mut R) {
    match message {
        WorkerMessage::Heartbeat(heartbeat) => {
            debug!("Heartbeat: {:?}", heartbeat);
            timing.apply(heartbeat, Instant::now());
        }
        WorkerMessage::Report(event) => reporter.report(&event),
    }
}

/// Deliver whatever the worker wrote before exiting. No deadlines apply.
async fn drain<R: Reporter + ?Sized>(
    messages: &mut UnboundedReceiver<WorkerMessage>,
    timing: &mut Timing,
    reporter: &mut R,
) {
    let drained = tokio::time::timeout(DRAIN_GRACE, async {
        while let Some(message) = messages.recv().await {
            handle(message, timing, reporter);
        }
    })
    .await;

    if let Timing::Armed { description, .. } = timing {
        warn!("Worker exited while running: {}", description);
    }
    if drained.is_err() {
        warn!("Worker channel still open {:?} after exit", DRAIN_GRACE);
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::models::{ReportEvent, TestResult};
    use crate::output::{NullReporter, RecordingReporter};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
    use tokio::task::JoinHandle;

    /// A worker played by a tokio task
    struct ScriptedWorker {
        task: JoinHandle<bool>,
        terminated: bool,
    }

    impl ScriptedWorker {
        fn spawn<F, Fut>(script: F) -> (Self, UnboundedReceiver<WorkerMessage>)
        where
            F: FnOnce(UnboundedSender<WorkerMessage>) -> Fut,
            Fut: std::future::Future<Output = bool> + Send + 'static,
        {
            let (tx, rx) = unbounded_channel();
            let task = tokio::spawn(script(tx));
            (
                Self {
                    task,
                    terminated: false,
                },
                rx,
            )
        }
    }

    impl Worker for ScriptedWorker {
        fn has_exited(&mut self) -> Result<Option<WorkerExit>> {
            if !self.task.is_finished() {
                return Ok(None);
            }
            Ok(Some(WorkerExit::Success))
        }

        async fn terminate(&mut self) -> Result<()> {
            self.task.abort();
            self.terminated = true;
            Ok(())
        }
    }

    struct CrashingWorker;

    impl Worker for CrashingWorker {
        fn has_exited(&mut self) -> Result<Option<WorkerExit>> {
            Ok(Some(WorkerExit::Failure("exit status: 101".into())))
        }

        async fn terminate(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn start(description: &str, millis: u64) -> WorkerMessage {
        WorkerMessage::Heartbeat(Heartbeat::Start {
            description: description.to_string(),
            timeout: Duration::from_millis(millis),
        })
    }

    fn stop() -> WorkerMessage {
        WorkerMessage::Heartbeat(Heartbeat::Stop)
    }

    fn result(description: &str) -> WorkerMessage {
        WorkerMessage::Report(ReportEvent::Result {
            result: TestResult::pass(description),
        })
    }

    async fn sleep_ms(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    fn supervisor() -> Supervisor {
        Supervisor::new(Duration::from_millis(20))
    }

    #[test]
    fn test_timing_state_machine() {
        let now = Instant::now();
        let mut timing = Timing::Idle;
        assert!(timing.expired(now + Duration::from_secs(3600)).is_none());

        timing.apply(
            Heartbeat::Start {
                description: "loops".into(),
                timeout: Duration::from_secs(1),
            },
            now,
        );
        assert!(matches!(timing, Timing::Armed { deadline: Some(_), .. }));
        assert!(timing.expired(now + Duration::from_millis(999)).is_none());
        assert_eq!(
            timing.expired(now + Duration::from_secs(1)),
            Some(GradeError::Timeout {
                description: "loops".into(),
                timeout: Duration::from_secs(1)
            })
        );

        timing.apply(Heartbeat::Stop, now);
        assert_eq!(timing, Timing::Idle);
        assert!(timing.expired(now + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_unrepresentable_deadline_never_expires() {
        let line = r#"{"heartbeat":{"kind":"start","description":"unbounded","timeout":{"secs":18446744073709551615,"nanos":999999999}}}"#;
        let WorkerMessage::Heartbeat(heartbeat) = WorkerMessage::decode(line).unwrap() else {
            panic!("expected a heartbeat");
        };
        assert_eq!(
            heartbeat,
            Heartbeat::Start {
                description: "unbounded".into(),
                timeout: Duration::MAX
            }
        );

        let now = Instant::now();
        let mut timing = Timing::Idle;
        timing.apply(heartbeat, now);

        assert!(matches!(timing, Timing::Armed { deadline: None, .. }));
        assert!(timing.expired(now + Duration::from_secs(86_400 * 365)).is_none());

        timing.apply(Heartbeat::Stop, now);
        assert_eq!(timing, Timing::Idle);
    }

    #[tokio::test]
    async fn test_unbounded_timeout_is_supervised_to_completion() {
        let (mut worker, mut rx) = ScriptedWorker::spawn(|tx| async move {
            let _ = tx.send(stop());
            let _ = tx.send(WorkerMessage::Heartbeat(Heartbeat::Start {
                description: "unbounded".into(),
                timeout: Duration::MAX,
            }));
            sleep_ms(100).await;
            let _ = tx.send(stop());
            let _ = tx.send(result("unbounded"));
            true
        });

        let mut sink = NullReporter;
        let mut recorder = RecordingReporter::new(&mut sink, "hello.py");
        supervisor()
            .supervise(&mut worker, &mut rx, &mut recorder)
            .await
            .unwrap();

        let report = recorder.finish();
        assert_eq!(report.results.len(), 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_restart_replaces_deadline() {
        let now = Instant::now();
        let mut timing = Timing::Idle;
        timing.apply(
            Heartbeat::Start {
                description: "slow".into(),
                timeout: Duration::from_secs(10),
            },
            now,
        );
        timing.apply(
            Heartbeat::Start {
                description: "quick".into(),
                timeout: Duration::from_millis(100),
            },
            now + Duration::from_millis(50),
        );

        let err = timing.expired(now + Duration::from_millis(150)).unwrap();
        assert_eq!(
            err,
            GradeError::Timeout {
                description: "quick".into(),
                timeout: Duration::from_millis(100)
            }
        );
    }

    #[tokio::test]
    async fn test_completed_worker_reports_everything() {
        let (mut worker, mut rx) = ScriptedWorker::spawn(|tx| async move {
            let _ = tx.send(stop());
            let _ = tx.send(start("a", 1000));
            sleep_ms(50).await;
            let _ = tx.send(stop());
            let _ = tx.send(start("b", 1000));
            sleep_ms(50).await;
            let _ = tx.send(stop());
            let _ = tx.send(result("a"));
            let _ = tx.send(result("b"));
            true
        });

        let mut sink = NullReporter;
        let mut recorder = RecordingReporter::new(&mut sink, "hello.py");
        supervisor()
            .supervise(&mut worker, &mut rx, &mut recorder)
            .await
            .unwrap();

        let report = recorder.finish();
        assert_eq!(report.results.len(), 2);
        assert!(report.errors.is_empty());
        assert!(!worker.terminated);
    }

    #[tokio::test]
    async fn test_overrun_terminates_worker() {
        let (mut worker, mut rx) = ScriptedWorker::spawn(|tx| async move {
            let _ = tx.send(stop());
            let _ = tx.send(start("a", 1000));
            sleep_ms(20).await;
            let _ = tx.send(stop());
            let _ = tx.send(start("b", 200));
            sleep_ms(5000).await;
            let _ = tx.send(stop());
            let _ = tx.send(start("c", 1000));
            let _ = tx.send(result("a"));
            true
        });

        let begin = Instant::now();
        let mut sink = NullReporter;
        let mut recorder = RecordingReporter::new(&mut sink, "hello.py");
        let err = supervisor()
            .supervise(&mut worker, &mut rx, &mut recorder)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GradeError::Timeout {
                description: "b".into(),
                timeout: Duration::from_millis(200)
            }
        );
        // 20ms for "a", 200ms timeout for "b", at most two polls late
        assert!(begin.elapsed() < Duration::from_millis(20 + 200 + 2 * 20 + 150));
        assert!(worker.terminated);

        let report = recorder.finish();
        assert!(report.results.is_empty());
        assert_eq!(report.errors, vec![err.to_string()]);
    }

    #[tokio::test]
    async fn test_heartbeat_reset_flags_only_the_overrunning_test() {
        let (mut worker, mut rx) = ScriptedWorker::spawn(|tx| async move {
            let _ = tx.send(stop());
            let _ = tx.send(start("first", 300));
            sleep_ms(200).await;
            let _ = tx.send(stop());
            let _ = tx.send(start("second", 150));
            sleep_ms(5000).await;
            true
        });

        let err = supervisor()
            .supervise(&mut worker, &mut rx, &mut NullReporter)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GradeError::Timeout {
                description: "second".into(),
                timeout: Duration::from_millis(150)
            }
        );
    }

    #[tokio::test]
    async fn test_idle_worker_is_never_timed_out() {
        let (mut worker, mut rx) = ScriptedWorker::spawn(|tx| async move {
            let _ = tx.send(stop());
            let _ = tx.send(start("quick", 50));
            let _ = tx.send(stop());
            sleep_ms(200).await;
            true
        });

        supervisor()
            .supervise(&mut worker, &mut rx, &mut NullReporter)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_abnormal_exit_is_reported() {
        let (tx, mut rx) = unbounded_channel();
        tx.send(result("a")).unwrap();
        drop(tx);

        let mut sink = NullReporter;
        let mut recorder = RecordingReporter::new(&mut sink, "hello.py");
        let err = supervisor()
            .supervise(&mut CrashingWorker, &mut rx, &mut recorder)
            .await
            .unwrap_err();

        assert_eq!(err, GradeError::WorkerExited("exit status: 101".into()));
        let report = recorder.finish();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.errors.len(), 1);
    }
}
