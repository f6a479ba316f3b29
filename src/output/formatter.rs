//! Output formatters for grading results
//!
//! Provides table, JSON, CSV and summary output formats.

use std::io::Write;

use crate::models::{BatchSummary, TestResult, TestStatus};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }

    fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonPretty)
    }
}

/// Result formatter
#[derive(Clone, Debug)]
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format the header shown before a module's results
    pub fn format_announce(&self, label: &str) -> String {
        match self.format {
            OutputFormat::Table | OutputFormat::Summary => {
                if self.colorize {
                    format!("\x1b[1mTesting: {label}\x1b[0m")
                } else {
                    format!("Testing: {label}")
                }
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.json(&serde_json::json!({ "module": label }))
            }
            OutputFormat::Csv => format!("# {label}"),
        }
    }

    /// Format a single test result
    pub fn format_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_result_table(result),
            OutputFormat::Json | OutputFormat::JsonPretty => self.json(result),
            OutputFormat::Csv => self.format_result_csv(result),
            OutputFormat::Summary => self.format_result_summary(result),
        }
    }

    /// Format an error notice
    pub fn format_error(&self, message: &str) -> String {
        if self.format.is_json() {
            return self.json(&serde_json::json!({ "error": message }));
        }
        if self.colorize {
            format!("\x1b[31m{message}\x1b[0m")
        } else {
            message.to_string()
        }
    }

    fn json<T: serde::Serialize + ?Sized>(&self, value: &T) -> String {
        if self.format == OutputFormat::JsonPretty {
            serde_json::to_string_pretty(value).unwrap_or_default()
        } else {
            serde_json::to_string(value).unwrap_or_default()
        }
    }

    fn format_result_table(&self, result: &TestResult) -> String {
        let status_str = if self.colorize {
            match result.status {
                TestStatus::Pass => "\x1b[32m✓ PASS\x1b[0m",
                TestStatus::Fail => "\x1b[31m✗ FAIL\x1b[0m",
            }
        } else {
            match result.status {
                TestStatus::Pass => "✓ PASS",
                TestStatus::Fail => "✗ FAIL",
            }
        };

        let mut line = format!("  {} {}", status_str, result.description);
        if let Some(ms) = result.duration_ms {
            line.push_str(&format!(" [{ms}ms]"));
        }
        if let Some(msg) = &result.message {
            for msg_line in msg.lines() {
                line.push_str(&format!("\n      - {msg_line}"));
            }
        }
        line
    }

    fn format_result_csv(&self, result: &TestResult) -> String {
        format!(
            "\"{}\",{},{},\"{}\"",
            result.description.replace('"', "\"\""),
            result.status,
            result.duration_ms.map(|ms| ms.to_string()).unwrap_or_default(),
            result.message.as_deref().unwrap_or("").replace('"', "\"\"")
        )
    }

    fn format_result_summary(&self, result: &TestResult) -> String {
        format!("{} {}", result.status.symbol(), result.description)
    }

    /// Format the summary printed after a batch
    pub fn format_summary(&self, summary: &BatchSummary) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => self.json(summary),
            OutputFormat::Summary | OutputFormat::Csv => self.format_summary_brief(summary),
            OutputFormat::Table => self.format_summary_table(summary),
        }
    }

    fn format_summary_table(&self, summary: &BatchSummary) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!("║  Module: {:51} ║\n", summary.module));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        for report in &summary.reports {
            let status = if report.is_clean() { "✓" } else { "✗" };
            output.push_str(&format!(
                "║  {} {:30} pass {:3} | fail {:3} | err {:3}  ║\n",
                status,
                report.label,
                report.passed(),
                report.failed(),
                report.errors.len()
            ));
        }

        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{:3}\x1b[0m", summary.passed)
        } else {
            format!("{:3}", summary.passed)
        };
        let fail_str = if self.colorize && summary.failed > 0 {
            format!("\x1b[31m{:3}\x1b[0m", summary.failed)
        } else {
            format!("{:3}", summary.failed)
        };

        output.push_str(&format!(
            "║  Total: {:3} | Pass: {} | Fail: {} | Error: {:3}             ║\n",
            summary.total, pass_str, fail_str, summary.errors
        ));
        output.push_str(&format!(
            "║  Pass Rate: {:5.1}%                                           ║\n",
            summary.pass_rate()
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_summary_brief(&self, summary: &BatchSummary) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%), {} error(s) across {} file(s)",
            summary.module,
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.errors,
            summary.reports.len()
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Write a batch summary to a file
pub fn write_summary_to_file(
    path: &str,
    summary: &BatchSummary,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let content = formatter.format_summary(summary);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
