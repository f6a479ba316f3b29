//! Worker to supervisor messages
//!
//! The worker writes one JSON encoded [`WorkerMessage`] per line on its
//! stdout; the supervisor reads them in order.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::TestResult;

/// Timing signal for the supervisor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Heartbeat {
    /// No test is being timed
    Stop,
    /// A test started; (re)arm the deadline
    Start {
        description: String,
        timeout: Duration,
    },
}

/// Final output of a module run, forwarded to the reporter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    Announce { label: String },
    Result { result: TestResult },
    Error { message: String },
}

/// One line on the worker channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerMessage {
    Heartbeat(Heartbeat),
    Report(ReportEvent),
}

impl WorkerMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
