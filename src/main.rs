//! bagsweep - Bulk Bag Discovery and Validation
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use bagsweep::config::{self, CliArgs, RunConfig, RunMode};
use bagsweep::finder::{self, BagLocator};
use bagsweep::progress::{print_header, print_summary, ProgressReporter};
use bagsweep::report::ReportSink;
use bagsweep::validate::{BagValidator, BulkRunner};
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments; clap exits with code 2 on usage errors and
    // handles -h itself.
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = RunConfig::from_args(args).context("Invalid configuration")?;

    // The report log lives in the working directory, named for today.
    let cwd = env::current_dir().context("Cannot determine working directory")?;
    let sink = ReportSink::open(&cwd).context("Failed to open validation report log")?;

    if config.show_progress {
        print_header(&describe_mode(&config.mode), config.processes, sink.path());
    }
    let progress = if config.show_progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    let hidden = finder::platform_default();
    let paths: Vec<PathBuf> = match &config.mode {
        RunMode::Single(path) => vec![path.clone()],
        RunMode::FileList(file) => config::load_path_list(file)
            .with_context(|| format!("Failed to read path list '{}'", file.display()))?,
        RunMode::Walk(root) => {
            let mut locator = BagLocator::new(hidden.as_ref(), &sink);
            if let Some(ref p) = progress {
                locator = locator.with_progress(p);
            }
            locator.find(root)
        }
    };

    if paths.is_empty() {
        info!("No bags to validate");
    }

    let validator = BagValidator::new(&sink, config.processes);
    let mut runner = BulkRunner::new(validator);
    if let Some(ref p) = progress {
        runner = runner.with_progress(p);
    }
    let report = runner.run(&paths);

    if let Some(ref p) = progress {
        p.finish_and_clear();
    }
    sink.finish().context("Failed to flush validation report")?;

    if config.show_progress {
        print_summary(
            report.bags.len(),
            report.valid_count(),
            report.invalid_count(),
            report.total_payload_files(),
            report.total_payload_bytes(),
            report.duration,
            sink.path(),
        );
    }

    // Invalid bags are a reported outcome, not a process failure.
    if report.invalid_count() > 0 {
        info!(
            invalid = report.invalid_count(),
            "Validation completed with invalid bags"
        );
    }

    Ok(())
}

fn describe_mode(mode: &RunMode) -> String {
    match mode {
        RunMode::FileList(path) => format!("path list {}", path.display()),
        RunMode::Walk(path) => format!("tree {}", path.display()),
        RunMode::Single(path) => format!("bag {}", path.display()),
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("bagsweep=debug,warn")
    } else {
        EnvFilter::new("bagsweep=info,warn")
    };

    // Diagnostics go to stderr; stdout belongs to the report sink.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
