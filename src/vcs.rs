// src/vcs.rs

use crate::model::{round2, HistorySummary};
use crate::process::{CommandOutcome, CommandRunner};
use chrono::{DateTime, FixedOffset};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Runs the history queries against a working copy. Each query stands on its
/// own: a failure or timeout only leaves its own fields empty.
pub fn query_history<R: CommandRunner + ?Sized>(
    runner: &R,
    repo_dir: &Path,
    timeout: Duration,
) -> HistorySummary {
    let git = |args: &[&str]| -> Option<String> {
        match runner.run("git", args, Some(repo_dir), timeout) {
            CommandOutcome::Completed {
                success: true,
                stdout,
                ..
            } => Some(stdout),
            CommandOutcome::TimedOut => {
                warn!(
                    repo = %repo_dir.display(),
                    command = %args.join(" "),
                    timeout = ?timeout,
                    "git query timed out"
                );
                None
            }
            other => {
                debug!(
                    repo = %repo_dir.display(),
                    command = %args.join(" "),
                    reason = %other.failure_text().trim(),
                    "git query failed"
                );
                None
            }
        }
    };

    let default_branch =
        git(&["rev-parse", "--abbrev-ref", "HEAD"]).and_then(|out| parse_branch(&out));
    let commits_count = git(&["rev-list", "--count", "HEAD"]).and_then(|out| parse_count(&out));
    let (first_commit, last_commit) = git(&["log", "--reverse", "--format=%aI"])
        .map(|out| parse_date_range(&out))
        .unwrap_or((None, None));
    let contributors_count =
        git(&["shortlog", "-sne", "HEAD"]).map(|out| count_nonblank_lines(&out));
    let avg_lines_changed_per_commit = git(&["log", "--pretty=tformat:", "--numstat"])
        .and_then(|out| average_change(sum_numstat(&out), commits_count));

    HistorySummary {
        default_branch,
        commits_count,
        first_commit,
        last_commit,
        contributors_count,
        avg_lines_changed_per_commit,
    }
}

pub fn parse_branch(output: &str) -> Option<String> {
    let branch = output.trim();
    (!branch.is_empty()).then(|| branch.to_string())
}

/// A non-negative integer, or `None` for anything else
pub fn parse_count(output: &str) -> Option<u64> {
    let text = output.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// First and last timestamps of a chronological `%aI` listing
pub fn parse_date_range(
    output: &str,
) -> (Option<DateTime<FixedOffset>>, Option<DateTime<FixedOffset>>) {
    let mut stamps = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| DateTime::parse_from_rfc3339(l).ok());
    let first = stamps.next();
    let last = stamps.last().or(first);
    (first, last)
}

pub fn count_nonblank_lines(output: &str) -> u64 {
    output.lines().filter(|l| !l.trim().is_empty()).count() as u64
}

/// Total added + deleted lines in `--numstat` output. Binary files report
/// `-` and count as zero.
pub fn sum_numstat(output: &str) -> u64 {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.trim().split('\t');
            let added = parts.next()?;
            let deleted = parts.next()?;
            parts.next()?;
            Some(parse_count(added).unwrap_or(0) + parse_count(deleted).unwrap_or(0))
        })
        .sum()
}

/// Average lines changed per commit, only for a positive commit count
pub fn average_change(total_changes: u64, commits: Option<u64>) -> Option<f64> {
    match commits {
        Some(n) if n > 0 => Some(round2(total_changes as f64 / n as f64)),
        _ => None,
    }
}
