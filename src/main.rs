//! Grader - assignment grading test runner
//!
//! Runs registered test specifications against student source files. Each
//! graded file gets its own worker process; the grading process supervises
//! it and kills it when a test overruns its timeout.
//!
//! ## Usage
//!
//! ```bash
//! # Grade hello.py in the current directory
//! grader test hello
//!
//! # Grade every file of a module
//! grader module intro
//!
//! # List registered specifications
//! grader list --detailed
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

mod cli;
mod config;
mod error;
mod executor;
mod locator;
mod models;
mod output;
mod tests;
mod utils;

use cli::Args;
use config::{AppConfig, EnvConfig};
use error::GradeError;
use executor::{run_worker, Grader, LineChannel, RunOptions};
use locator::Locator;
use models::TestContext;
use output::{ConsoleReporter, OutputFormat, Reporter, ResultFormatter};
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let env = EnvConfig::load();
    let verbose = args.verbose || env.verbose.unwrap_or(false);

    if let cli::Command::Worker(worker_args) = args.command {
        init_logger(if verbose { LogLevel::Debug } else { LogLevel::Warn });
        return Ok(run_worker_process(worker_args));
    }

    let config = AppConfig::resolve(args.config.as_deref(), &env)?;

    let level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::from_str(&config.log_level).unwrap_or(LogLevel::Warn)
    };
    init_logger(level);

    let format_name = args.format.clone().unwrap_or_else(|| config.format.clone());
    let format = OutputFormat::from_str(&format_name).unwrap_or(OutputFormat::Table);
    let mut formatter = ResultFormatter::new(format);
    if args.no_color || !config.color {
        formatter = formatter.no_color();
    }

    match args.command {
        cli::Command::Test(test_args) => {
            let grader = build_grader(&config, verbose)?;
            let mut reporter = ConsoleReporter::new(formatter);
            Ok(run_test(test_args, &grader, &mut reporter).await)
        }
        cli::Command::Module(module_args) => {
            let grader = build_grader(&config, verbose)?;
            let mut reporter = ConsoleReporter::new(formatter);
            run_module(module_args, &grader, &mut reporter).await
        }
        cli::Command::List(list_args) => {
            list_specs(list_args);
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &config, &env, &format_name)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Worker(_) => Ok(ExitCode::SUCCESS),
    }
}

fn build_grader(config: &AppConfig, verbose: bool) -> Result<Grader> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let locator = Locator::new(tests::registry(), &config.source_extension, cwd);

    Ok(Grader::new(locator)?
        .with_poll_interval(config.poll_interval())
        .with_default_timeout(config.default_timeout())
        .verbose(verbose))
}

async fn run_test(args: cli::TestArgs, grader: &Grader, reporter: &mut ConsoleReporter) -> ExitCode {
    match grader.test_file(&args.file, &args.module, reporter).await {
        Ok(report) if report.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) if e.is_discovery() => ExitCode::from(2),
        Err(_) => ExitCode::from(1),
    }
}

async fn run_module(
    args: cli::ModuleArgs,
    grader: &Grader,
    reporter: &mut ConsoleReporter,
) -> Result<ExitCode> {
    let summary = match grader.test_module(&args.module, reporter).await {
        Ok(summary) => summary,
        Err(_) => return Ok(ExitCode::from(2)),
    };

    println!("{}", reporter.formatter().format_summary(&summary));

    if let Some(path) = &args.output {
        let file_format = if path.ends_with(".json") {
            OutputFormat::JsonPretty
        } else {
            OutputFormat::Table
        };
        output::write_summary_to_file(path, &summary, file_format)?;
        info!("Summary written to {}", path);
    }

    Ok(if summary.is_all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Body of the hidden `worker` subcommand; stdout is the message channel
fn run_worker_process(args: cli::WorkerArgs) -> ExitCode {
    let registry = tests::registry();
    let stdout = std::io::stdout();
    let mut channel = LineChannel::new(stdout.lock());

    let Some(spec) = registry.get(&args.spec) else {
        channel.display_error(&GradeError::UnknownSpec(args.spec).to_string());
        return ExitCode::SUCCESS;
    };

    let module = (spec.build)();
    let ctx = TestContext::new(&args.file);
    let options = RunOptions {
        default_timeout: Duration::from_millis(args.default_timeout_ms),
    };

    run_worker(&module, &ctx, &options, &mut channel);
    ExitCode::SUCCESS
}

fn list_specs(args: cli::ListArgs) {
    let registry = tests::registry();

    println!("\nRegistered Test Specifications ({} total)\n", registry.entries().len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for module in registry.modules() {
        println!("\n{module}:");
        println!("──────────────────────────────────────────────────────────────────────");

        for entry in registry.entries().iter().filter(|e| e.module == module) {
            let spec = (entry.build)();
            println!("  {:20} {} test(s)", entry.name, spec.factories().len());

            if args.detailed {
                for factory in spec.factories() {
                    let test = factory.create();
                    println!("      - {:24} {}", factory.name(), test.description());
                }
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn manage_config(
    args: cli::ConfigArgs,
    config: &AppConfig,
    env: &EnvConfig,
    format: &str,
) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            AppConfig::default().save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env: show_env } => {
            if show_env {
                if !env.has_any() {
                    println!("No GRADER_* environment variables are set.\n");
                }
                env.print_summary();
                println!();
                config::print_env_help();
            } else {
                let output = if format.starts_with("json") {
                    serde_json::to_string_pretty(config)?
                } else {
                    serde_yaml::to_string(config)?
                };
                println!("{output}");
            }
        }
    }

    Ok(())
}
