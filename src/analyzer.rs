// src/analyzer.rs

use crate::locator::{locate, LocatorMode};
use crate::loc::count_lines;
use crate::model::{round2, RepositoryMetrics, Status};
use crate::process::CommandRunner;
use crate::slug::parse_slug;
use crate::vcs::query_history;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Settings shared by every per-repository analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub mode: LocatorMode,
    /// Bound on each history query and on line counting
    pub query_timeout: Duration,
}

/// Produces one [`RepositoryMetrics`] per repository URL.
pub struct Analyzer<R: CommandRunner> {
    runner: R,
    config: AnalysisConfig,
}

impl<R: CommandRunner> Analyzer<R> {
    pub fn new(runner: R, config: AnalysisConfig) -> Self {
        Self { runner, config }
    }

    /// Analyzes one repository. Never fails: problems end up in
    /// `clone_status` and in whichever fields stay empty.
    pub fn analyze(&self, repo_url: &str) -> RepositoryMetrics {
        let Some(slug) = parse_slug(repo_url) else {
            warn!(url = repo_url, "Invalid repository URL");
            return RepositoryMetrics::new(repo_url, "", Status::error("invalid GitHub URL"));
        };

        let started = Instant::now();
        let copy = match locate(&self.runner, &self.config.mode, &slug) {
            Ok(copy) => copy,
            Err(e) => {
                warn!(slug = %slug, error = %e, "Could not obtain working copy");
                return RepositoryMetrics::new(repo_url, slug, Status::error(e));
            }
        };
        // `copy` is dropped on every return below, removing temporary clones.
        let repo_dir = copy.path();
        debug!(
            slug = %slug,
            path = %repo_dir.display(),
            temporary = copy.is_temporary(),
            "Working copy ready"
        );
        let timeout = self.config.query_timeout;

        let mut metrics = RepositoryMetrics::new(repo_url, slug.as_str(), Status::Ok);
        metrics.apply_history(query_history(&self.runner, repo_dir, timeout));
        info!(slug = %slug, commits = ?metrics.commits_count, "History collected");

        metrics.total_lines = count_lines(&self.runner, repo_dir, timeout);
        metrics.size_on_disk_mb = Some(dir_size_mb(repo_dir));

        info!(slug = %slug, elapsed = ?started.elapsed(), "Analysis finished");
        metrics
    }
}

/// Total size of all files under `path` in megabytes, two decimals.
/// Symlinks to files count with their target's size; symlinked
/// directories are not descended into.
pub fn dir_size_mb(path: &Path) -> f64 {
    let bytes: u64 = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| fs::metadata(entry.path()).ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum();
    round2(bytes as f64 / BYTES_PER_MB)
}
