//! Result reporting
//!
//! The [`Reporter`] receives the output of a module run: the module label,
//! each displayed result in presentation order, and error notices.

use std::io::Write;

use super::{OutputFormat, ResultFormatter};
use crate::models::{ModuleReport, ReportEvent, TestResult};

/// Receiver of module run output
pub trait Reporter {
    /// Announce the graded file, once, before any test output
    fn announce(&mut self, label: &str);

    /// Display one test result
    fn display(&mut self, result: &TestResult);

    /// Display a setup, teardown, timeout or discovery failure
    fn display_error(&mut self, message: &str);

    /// Dispatch a report event received from a worker
    fn report(&mut self, event: &ReportEvent) {
        match event {
            ReportEvent::Announce { label } => self.announce(label),
            ReportEvent::Result { result } => self.display(result),
            ReportEvent::Error { message } => self.display_error(message),
        }
    }
}

/// Prints to stdout through a [`ResultFormatter`]
pub struct ConsoleReporter<W: Write = std::io::Stdout> {
    formatter: ResultFormatter,
    out: W,
}

impl ConsoleReporter {
    pub fn new(formatter: ResultFormatter) -> Self {
        Self::with_writer(formatter, std::io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(formatter: ResultFormatter, out: W) -> Self {
        Self { formatter, out }
    }

    pub fn formatter(&self) -> &ResultFormatter {
        &self.formatter
    }

    fn emit(&mut self, line: String) {
        if line.is_empty() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!("Failed to write report output: {}", e);
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn announce(&mut self, label: &str) {
        let line = self.formatter.format_announce(label);
        self.emit(line);
    }

    fn display(&mut self, result: &TestResult) {
        let line = self.formatter.format_result(result);
        self.emit(line);
    }

    fn display_error(&mut self, message: &str) {
        let line = self.formatter.format_error(message);
        self.emit(line);
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(ResultFormatter::new(OutputFormat::Table))
    }
}

/// Forwards to another reporter while keeping a [`ModuleReport`]
pub struct RecordingReporter<'a, R: Reporter + ?Sized> {
    inner: &'a mut R,
    report: ModuleReport,
}

impl<'a, R: Reporter + ?Sized> RecordingReporter<'a, R> {
    pub fn new(inner: &'a mut R, label: impl Into<String>) -> Self {
        Self {
            inner,
            report: ModuleReport::new(label),
        }
    }

    pub fn finish(self) -> ModuleReport {
        self.report
    }
}

impl<R: Reporter + ?Sized> Reporter for RecordingReporter<'_, R> {
    fn announce(&mut self, label: &str) {
        self.report.label = label.to_string();
        self.inner.announce(label);
    }

    fn display(&mut self, result: &TestResult) {
        self.report.results.push(result.clone());
        self.inner.display(result);
    }

    fn display_error(&mut self, message: &str) {
        self.report.errors.push(message.to_string());
        self.inner.display_error(message);
    }
}

/// Reporter that drops everything
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn announce(&mut self, _label: &str) {}
    fn display(&mut self, _result: &TestResult) {}
    fn display_error(&mut self, _message: &str) {}
}
