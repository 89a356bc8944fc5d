// src/main.rs

mod analyzer;
mod cli;
mod error;
mod input;
mod loc;
mod locator;
mod model;
mod orchestrator;
mod process;
mod report;
mod slug;
mod vcs;

use analyzer::Analyzer;
use clap::Parser;
use cli::Args;
use process::ProcessRunner;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);
    let start_time = Instant::now();

    let urls = match input::read_repo_urls(&args.input, &args.column) {
        Ok(urls) => urls,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    info!(input = %args.input.display(), repositories = urls.len(), "Loaded repository list");

    let analyzer = Analyzer::new(ProcessRunner, args.to_config());
    let jobs = args.jobs.unwrap_or_else(orchestrator::default_concurrency);
    let batch = match orchestrator::run(&urls, jobs, !args.quiet, |url| analyzer.analyze(url)) {
        Ok(batch) => batch,
        Err(e) => {
            error!("Failed to start worker pool: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = report::write_report(&args.output, &batch) {
        error!(output = %args.output.display(), "Failed to write report: {e}");
        return ExitCode::FAILURE;
    }

    let ok = batch.iter().filter(|r| r.clone_status.is_ok()).count();
    info!(
        output = %args.output.display(),
        ok,
        failed = batch.len() - ok,
        elapsed = ?start_time.elapsed(),
        "Report written"
    );
    ExitCode::SUCCESS
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
