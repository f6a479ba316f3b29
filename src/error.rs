//! Grading errors
//!
//! The error kinds a module run can end with. Every variant is terminal for
//! the current module run; batch grading moves on to the next file.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to the user while grading
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GradeError {
    #[error("No test found for {0}")]
    NoTestFound(String),

    #[error("no tests found in module: {0}")]
    NoTestsInModule(String),

    #[error("Something went wrong at setup:\n{0}")]
    Setup(String),

    #[error("Something went wrong at closing:\n{0}")]
    Teardown(String),

    #[error("Timeout ({} seconds) reached during: {description}", format_secs(.timeout))]
    Timeout {
        description: String,
        timeout: Duration,
    },

    #[error("Dependency cycle detected at test '{0}'")]
    Cycle(String),

    #[error("Two different tests are registered under the name '{0}'")]
    DuplicateTest(String),

    #[error("Something went wrong during '{description}':\n{message}")]
    UnhandledTest {
        description: String,
        message: String,
    },

    #[error("Test worker exited unexpectedly ({0})")]
    WorkerExited(String),

    #[error("Failed to start test worker: {0}")]
    Spawn(String),

    #[error("Unknown test specification: {0}")]
    UnknownSpec(String),
}

impl GradeError {
    /// Whether the error was raised before any test could run
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            GradeError::NoTestFound(_) | GradeError::NoTestsInModule(_) | GradeError::UnknownSpec(_)
        )
    }
}

/// Render a duration the way timeouts are declared: whole seconds stay whole
fn format_secs(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        timeout.as_secs().to_string()
    } else {
        format!("{}", timeout.as_secs_f64())
    }
}
