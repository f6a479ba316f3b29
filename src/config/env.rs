//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use super::AppConfig;

/// Environment variable prefix
const ENV_PREFIX: &str = "GRADER";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Polling interval from GRADER_POLL_INTERVAL_MS
    pub poll_interval_ms: Option<u64>,
    /// Default test timeout from GRADER_TIMEOUT
    pub timeout: Option<u64>,
    /// Source extension from GRADER_EXTENSION
    pub extension: Option<String>,
    /// Output format from GRADER_FORMAT
    pub format: Option<String>,
    /// Config file from GRADER_CONFIG
    pub config_file: Option<String>,
    /// Verbose from GRADER_VERBOSE
    pub verbose: Option<bool>,
    /// Log level from GRADER_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            poll_interval_ms: get_env_parse("POLL_INTERVAL_MS"),
            timeout: get_env_parse("TIMEOUT"),
            extension: get_env("EXTENSION"),
            format: get_env("FORMAT"),
            config_file: get_env("CONFIG"),
            verbose: get_env_bool("VERBOSE"),
            log_level: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.poll_interval_ms.is_some()
            || self.timeout.is_some()
            || self.extension.is_some()
            || self.format.is_some()
            || self.config_file.is_some()
            || self.verbose.is_some()
            || self.log_level.is_some()
    }

    /// Override `config` with whatever is set
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(secs) = self.timeout {
            config.default_timeout_secs = secs;
        }
        if let Some(extension) = &self.extension {
            config.source_extension = extension.clone();
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_POLL_INTERVAL_MS: {:?}", ENV_PREFIX, self.poll_interval_ms);
        println!("  {}_TIMEOUT:          {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_EXTENSION:        {:?}", ENV_PREFIX, self.extension);
        println!("  {}_FORMAT:           {:?}", ENV_PREFIX, self.format);
        println!("  {}_CONFIG:           {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_VERBOSE:          {:?}", ENV_PREFIX, self.verbose);
        println!("  {}_LOG:              {:?}", ENV_PREFIX, self.log_level);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all GRADER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_POLL_INTERVAL_MS  Supervisor polling interval in milliseconds");
    println!("  {ENV_PREFIX}_TIMEOUT           Timeout for tests that declare none, in seconds");
    println!("  {ENV_PREFIX}_EXTENSION         Extension of graded source files (default: py)");
    println!("  {ENV_PREFIX}_FORMAT            Output format (table, json, csv, summary)");
    println!("  {ENV_PREFIX}_CONFIG            Path to configuration file");
    println!("  {ENV_PREFIX}_VERBOSE           Enable verbose output (true/false)");
    println!("  {ENV_PREFIX}_LOG               Log level (trace, debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_TIMEOUT=5");
    println!("  grader test hello");
}
