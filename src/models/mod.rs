//! Data models for grading
//!
//! This module contains all data structures shared by the worker and the
//! supervising process.

mod heartbeat;
mod test_case;
mod test_module;
mod test_result;

pub use heartbeat::{Heartbeat, ReportEvent, WorkerMessage};
pub use test_case::{TestCase, TestContext, TestFactory};
pub use test_module::{SpecEntry, SpecRegistry, TestModule};
pub use test_result::{BatchSummary, ModuleReport, TestResult, TestStatus};
