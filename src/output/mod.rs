//! Output formatting module
//!
//! Provides the reporter interface and the output formats for results.

mod formatter;
mod reporter;

pub use formatter::{write_summary_to_file, OutputFormat, ResultFormatter};
pub use reporter::{ConsoleReporter, NullReporter, RecordingReporter, Reporter};
