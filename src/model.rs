// src/model.rs

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};
use std::fmt;

/// Report columns, in output order
pub const COLUMNS: [&str; 11] = [
    "repo_url",
    "repo_slug",
    "contributors_count",
    "commits_count",
    "first_commit_iso",
    "last_commit_iso",
    "total_lines",
    "avg_lines_changed_per_commit",
    "default_branch",
    "size_on_disk_mb",
    "clone_status",
];

/// Outcome of one repository analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Ok,
    Error(String),
}

impl Status {
    pub fn error(message: impl fmt::Display) -> Self {
        Status::Error(message.to_string())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Error(message) => write!(f, "ERROR: {message}"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of the report. Every analytical field is independently optional.
/// Field order matches [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryMetrics {
    pub repo_url: String,
    pub repo_slug: String,
    pub contributors_count: Option<u64>,
    pub commits_count: Option<u64>,
    pub first_commit_iso: Option<DateTime<FixedOffset>>,
    pub last_commit_iso: Option<DateTime<FixedOffset>>,
    pub total_lines: Option<u64>,
    pub avg_lines_changed_per_commit: Option<f64>,
    pub default_branch: Option<String>,
    pub size_on_disk_mb: Option<f64>,
    pub clone_status: Status,
}

impl RepositoryMetrics {
    /// A record with nothing but the identifier, slug, and a status.
    pub fn new(repo_url: impl Into<String>, repo_slug: impl Into<String>, status: Status) -> Self {
        Self {
            repo_url: repo_url.into(),
            repo_slug: repo_slug.into(),
            contributors_count: None,
            commits_count: None,
            first_commit_iso: None,
            last_commit_iso: None,
            total_lines: None,
            avg_lines_changed_per_commit: None,
            default_branch: None,
            size_on_disk_mb: None,
            clone_status: status,
        }
    }

    /// Minimal record for a repository whose analysis failed outright
    pub fn failed(repo_url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(repo_url, String::new(), Status::error(message))
    }

    /// Fold in whatever the VCS queries managed to determine
    pub fn apply_history(&mut self, history: HistorySummary) {
        self.default_branch = history.default_branch;
        self.commits_count = history.commits_count;
        self.first_commit_iso = history.first_commit;
        self.last_commit_iso = history.last_commit;
        self.contributors_count = history.contributors_count;
        self.avg_lines_changed_per_commit = history.avg_lines_changed_per_commit;
    }
}

/// One record per input identifier, in input order
pub type AnalysisBatch = Vec<RepositoryMetrics>;

/// Fields derived from version-control history. Each is absent when its
/// query failed, timed out, or produced unparsable output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySummary {
    pub default_branch: Option<String>,
    pub commits_count: Option<u64>,
    pub first_commit: Option<DateTime<FixedOffset>>,
    pub last_commit: Option<DateTime<FixedOffset>>,
    pub contributors_count: Option<u64>,
    pub avg_lines_changed_per_commit: Option<f64>,
}

/// Rounds to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(Status::Ok.to_string(), "OK");
        assert_eq!(Status::error("boom").to_string(), "ERROR: boom");
    }

    #[test]
    fn failed_record_has_only_identifier_and_status() {
        let record = RepositoryMetrics::failed("https://github.com/a/b", "boom");
        assert_eq!(record.repo_url, "https://github.com/a/b");
        assert_eq!(record.repo_slug, "");
        assert_eq!(record.commits_count, None);
        assert_eq!(record.total_lines, None);
        assert_eq!(record.size_on_disk_mb, None);
        assert!(!record.clone_status.is_ok());
    }

    #[test]
    fn serialized_record_has_every_column() {
        let record = RepositoryMetrics::new("u", "a/b", Status::Ok);
        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        // serde_json sorts keys without preserve_order, so compare as sets
        assert_eq!(keys.len(), COLUMNS.len());
        for column in COLUMNS {
            assert!(value.get(column).is_some(), "missing column {column}");
        }
        assert_eq!(value["clone_status"], "OK");
        assert!(value["commits_count"].is_null());
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(10.0), 10.0);
    }
}
