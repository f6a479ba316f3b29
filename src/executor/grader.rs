//! Grading orchestration
//!
//! Runs one graded file, or every file of a module, each in its own worker
//! process under a [`Supervisor`]. Module runs happen one after another.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::{error, info};

use super::process::ChildWorker;
use super::runner::RunOptions;
use super::supervisor::Supervisor;
use crate::error::GradeError;
use crate::locator::{Locator, SourceFile};
use crate::models::{BatchSummary, ModuleReport, SpecEntry};
use crate::output::{RecordingReporter, Reporter};

/// Grades source files against registered test specifications
pub struct Grader {
    locator: Locator,
    supervisor: Supervisor,
    options: RunOptions,
    worker_exe: PathBuf,
    verbose: bool,
}

impl Grader {
    /// Create a grader that launches workers from the running executable
    pub fn new(locator: Locator) -> Result<Self> {
        let worker_exe =
            std::env::current_exe().context("Failed to locate the grader executable")?;

        Ok(Self {
            locator,
            supervisor: Supervisor::default(),
            options: RunOptions::default(),
            worker_exe,
            verbose: false,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.supervisor = Supervisor::new(interval);
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.options.default_timeout = timeout;
        self
    }

    pub fn with_worker_exe(mut self, path: impl Into<PathBuf>) -> Self {
        self.worker_exe = path.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Command line that runs `spec` against `file` in a worker process
    pub fn worker_command(&self, spec: &SpecEntry, file: &std::path::Path) -> Command {
        let mut command = Command::new(&self.worker_exe);
        if self.verbose {
            command.arg("--verbose");
        }
        command
            .arg("worker")
            .arg("--spec")
            .arg(spec.key())
            .arg("--file")
            .arg(file)
            .arg("--default-timeout-ms")
            .arg(self.options.default_timeout.as_millis().to_string());
        command
    }

    /// Run the tests associated with `target`.
    ///
    /// Discovery and spawn failures are reported and returned; everything
    /// that happens once the worker runs ends up in the returned report.
    pub async fn test_file<R>(
        &self,
        target: &str,
        module: &str,
        reporter: &mut R,
    ) -> Result<ModuleReport, GradeError>
    where
        R: Reporter + ?Sized,
    {
        let source = self.locator.source_file(target);

        let Some(spec) = self.locator.find_spec(&source.file_name, module) else {
            let err = GradeError::NoTestFound(source.file_name.clone());
            reporter.display_error(&err.to_string());
            return Err(err);
        };

        self.grade(&source, spec, reporter).await
    }

    /// Run `spec` against `source` in a supervised worker
    async fn grade<R>(
        &self,
        source: &SourceFile,
        spec: &SpecEntry,
        reporter: &mut R,
    ) -> Result<ModuleReport, GradeError>
    where
        R: Reporter + ?Sized,
    {
        info!(
            "Grading {} in {} with {}",
            source.file_name,
            source.dir.display(),
            spec.key()
        );

        let (mut worker, mut messages) =
            match ChildWorker::spawn(self.worker_command(spec, &source.path)) {
                Ok(spawned) => spawned,
                Err(e) => {
                    let err = GradeError::Spawn(format!("{e:#}"));
                    error!("{}", err);
                    reporter.display_error(&err.to_string());
                    return Err(err);
                }
            };

        let mut recorder = RecordingReporter::new(reporter, source.file_name.clone());
        if let Err(e) = self
            .supervisor
            .supervise(&mut worker, &mut messages, &mut recorder)
            .await
        {
            info!("{} ended early: {}", source.file_name, e);
        }

        Ok(recorder.finish())
    }

    /// Run every test specification registered under `module`
    pub async fn test_module<R>(&self, module: &str, reporter: &mut R) -> Result<BatchSummary, GradeError>
    where
        R: Reporter + ?Sized,
    {
        let specs = match self.locator.module_specs(module) {
            Some(specs) if !specs.is_empty() => specs,
            _ => {
                let err = GradeError::NoTestsInModule(module.to_string());
                reporter.display_error(&err.to_string());
                return Err(err);
            }
        };

        info!(
            "Grading {} *.{} file(s) in module {}",
            specs.len(),
            self.locator.extension(),
            module
        );

        let mut reports = Vec::with_capacity(specs.len());
        for spec in specs {
            let source = self.locator.source_file(spec.name);
            let report = match self.grade(&source, spec, reporter).await {
                Ok(report) => report,
                Err(e) => ModuleReport {
                    label: source.file_name,
                    results: Vec::new(),
                    errors: vec![e.to_string()],
                },
            };
            reports.push(report);
        }

        Ok(BatchSummary::new(module, reports))
    }
}
