//! Test result models
//!
//! Defines the result objects produced by test cases and the per-module and
//! per-batch summaries assembled from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Result of a single test execution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub description: String,
    pub status: TestStatus,
    pub duration_ms: Option<u64>,
    pub message: Option<String>,
}

impl TestResult {
    pub fn pass(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: TestStatus::Pass,
            duration_ms: None,
            message: None,
        }
    }

    pub fn fail(description: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: TestStatus::Fail,
            duration_ms: None,
            message: Some(message.into()),
        }
    }

    /// Pass or fail depending on `passed`; the message is only kept on failure
    pub fn check(description: impl Into<String>, passed: bool, message: impl Into<String>) -> Self {
        if passed {
            Self::pass(description)
        } else {
            Self::fail(description, message)
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn passed(&self) -> bool {
        self.status.is_success()
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.symbol(), self.description)?;
        if let Some(ms) = self.duration_ms {
            write!(f, " [{ms}ms]")?;
        }
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Everything reported for one module run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModuleReport {
    pub label: String,
    pub results: Vec<TestResult>,
    pub errors: Vec<String>,
}

impl ModuleReport {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    /// No failing results and no errors
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.failed() == 0
    }
}

/// Summary of a batch of module runs
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub module: String,
    pub graded_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub reports: Vec<ModuleReport>,
}

impl BatchSummary {
    pub fn new(module: impl Into<String>, reports: Vec<ModuleReport>) -> Self {
        let passed = reports.iter().map(|r| r.passed()).sum();
        let failed = reports.iter().map(|r| r.failed()).sum();
        let errors = reports.iter().map(|r| r.errors.len()).sum();

        Self {
            module: module.into(),
            graded_at: Utc::now(),
            total: passed + failed,
            passed,
            failed,
            errors,
            reports,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.errors == 0 && self.passed == self.total
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Module {} - {} file(s) - {}",
            self.module,
            self.reports.len(),
            self.graded_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Error: {}",
            self.total, self.passed, self.failed, self.errors
        )?;
        writeln!(f, "Pass Rate: {:.1}%", self.pass_rate())
    }
}
