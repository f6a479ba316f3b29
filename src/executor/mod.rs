//! Test execution engine
//!
//! Dependency resolution, the worker-side module runner, and the
//! supervisor that enforces per-test timeouts on isolated worker processes.

mod grader;
mod process;
mod resolver;
mod runner;
mod supervisor;

pub use grader::Grader;
pub use runner::{run_worker, LineChannel, RunOptions};

#[cfg(test)]
pub use resolver::resolve;
#[cfg(test)]
pub use runner::{run_module, HeartbeatSink};
