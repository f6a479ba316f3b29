//! Module execution inside the worker
//!
//! Runs `before`, the resolved tests and `after` strictly in sequence,
//! emitting a heartbeat around every test so the supervisor can time it.

use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::resolver::resolve;
use crate::error::GradeError;
use crate::models::{
    Heartbeat, ReportEvent, TestCase, TestContext, TestModule, TestResult, WorkerMessage,
};
use crate::output::Reporter;

/// Receiver of timing signals
pub trait HeartbeatSink {
    fn heartbeat(&mut self, heartbeat: Heartbeat);
}

/// Options for a module run
#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    /// Timeout applied to tests that declare none
    pub default_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(10),
        }
    }
}

/// What a completed module run produced
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Tests executed, in execution order
    pub executed: Vec<String>,
    /// Results handed to the reporter
    pub reported: usize,
}

/// Run `module` against the file in `ctx`.
///
/// Results are only reported once every test has run. The returned error
/// has not been reported yet; results reported before a teardown failure
/// stand.
pub fn run_module<S>(
    module: &TestModule,
    ctx: &TestContext,
    options: &RunOptions,
    sink: &mut S,
) -> Result<RunStats, GradeError>
where
    S: HeartbeatSink + Reporter,
{
    sink.heartbeat(Heartbeat::Stop);
    sink.announce(ctx.label());

    let tests = resolve(module.factories().iter().map(|f| f.create()).collect())?;

    if let Some(before) = module.before_hook() {
        before(ctx).map_err(|e| GradeError::Setup(format!("{e:#}")))?;
    }

    let mut stats = RunStats::default();
    let mut completed: Vec<(TestCase, Option<TestResult>)> = Vec::with_capacity(tests.len());

    for test in tests {
        let timeout = test.timeout_or(options.default_timeout);
        sink.heartbeat(Heartbeat::Start {
            description: test.description().to_string(),
            timeout,
        });

        let started = Instant::now();
        let result = test.run(ctx).map_err(|e| GradeError::UnhandledTest {
            description: test.description().to_string(),
            message: format!("{e:#}"),
        })?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!("{} took {}ms", test.description(), elapsed_ms);

        let result = result.map(|r| match r.duration_ms {
            Some(_) => r,
            None => r.with_duration(elapsed_ms),
        });
        stats.executed.push(test.description().to_string());
        completed.push((test, result));
        sink.heartbeat(Heartbeat::Stop);
    }

    // Stable sort: equal keys keep execution order
    completed.sort_by_key(|(test, _)| test.sort_key());
    for result in completed.iter().filter_map(|(_, r)| r.as_ref()) {
        sink.display(result);
        stats.reported += 1;
    }

    if let Some(after) = module.after_hook() {
        after(ctx).map_err(|e| GradeError::Teardown(format!("{e:#}")))?;
    }

    info!(
        "{}: ran {} test(s), reported {}",
        module.name(),
        stats.executed.len(),
        stats.reported
    );

    Ok(stats)
}

/// Worker end of the channel: one JSON message per line
pub struct LineChannel<W: Write> {
    out: W,
}

impl<W: Write> LineChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn send(&mut self, message: &WorkerMessage) {
        let sent = message
            .encode()
            .map_err(std::io::Error::from)
            .and_then(|line| {
                writeln!(self.out, "{line}")?;
                self.out.flush()
            });
        if let Err(e) = sent {
            warn!("Failed to send worker message: {}", e);
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> HeartbeatSink for LineChannel<W> {
    fn heartbeat(&mut self, heartbeat: Heartbeat) {
        self.send(&WorkerMessage::Heartbeat(heartbeat));
    }
}

impl<W: Write> Reporter for LineChannel<W> {
    fn announce(&mut self, label: &str) {
        self.send(&WorkerMessage::Report(ReportEvent::Announce {
            label: label.to_string(),
        }));
    }

    fn display(&mut self, result: &TestResult) {
        self.send(&WorkerMessage::Report(ReportEvent::Result {
            result: result.clone(),
        }));
    }

    fn display_error(&mut self, message: &str) {
        self.send(&WorkerMessage::Report(ReportEvent::Error {
            message: message.to_string(),
        }));
    }
}

/// Worker process body: run the module and report any error on the channel
pub fn run_worker<S>(module: &TestModule, ctx: &TestContext, options: &RunOptions, sink: &mut S)
where
    S: HeartbeatSink + Reporter,
{
    if let Err(e) = run_module(module, ctx, options, sink) {
        warn!("{}: {}", module.name(), e);
        sink.display_error(&e.to_string());
    }
}
