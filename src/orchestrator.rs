// src/orchestrator.rs

use crate::model::{AnalysisBatch, RepositoryMetrics};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};

/// Number of available processing units, at least one
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Runs `analyze` once per identifier on a dedicated pool of `concurrency`
/// workers. A panic inside one analysis becomes an error record for that
/// identifier only. The batch comes back in input order.
pub fn run<F>(
    identifiers: &[String],
    concurrency: usize,
    show_progress: bool,
    analyze: F,
) -> Result<AnalysisBatch, ThreadPoolBuildError>
where
    F: Fn(&str) -> RepositoryMetrics + Sync,
{
    let workers = concurrency.max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("analyzer-{i}"))
        .build()?;

    let total = identifiers.len();
    let bar = if show_progress {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {elapsed_precise} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };
    bar.set_message("Analyzing repositories");
    info!(repositories = total, workers, "Starting analysis");

    let done = AtomicUsize::new(0);
    let batch: AnalysisBatch = pool.install(|| {
        identifiers
            .par_iter()
            .progress_with(bar.clone())
            .map(|url| {
                let record = isolate(url, &analyze);
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                bar.suspend(|| {
                    info!(
                        url = %url,
                        status = %record.clone_status,
                        "[{finished}/{total}] done"
                    )
                });
                record
            })
            .collect()
    });
    bar.finish_with_message("Analysis complete");

    Ok(batch)
}

/// Converts a panic in one analysis into an error record keyed to `url`
fn isolate<F>(url: &str, analyze: &F) -> RepositoryMetrics
where
    F: Fn(&str) -> RepositoryMetrics,
{
    match panic::catch_unwind(AssertUnwindSafe(|| analyze(url))) {
        Ok(record) => record,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(url = %url, panic = %message, "Analysis panicked");
            RepositoryMetrics::failed(url, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "analysis panicked".to_string()
    }
}
