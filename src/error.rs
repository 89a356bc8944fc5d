// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Longest slice of clone output kept in a locate error
pub const MAX_CLONE_MESSAGE: usize = 240;

/// Failure to obtain a working copy for one repository
#[derive(Error, Debug)]
pub enum LocateError {
    /// `git clone` exited non-zero, timed out, or could not be spawned
    #[error("{message}")]
    Clone { message: String },

    /// Local mode: no checkout at the expected path
    #[error("not found locally: {}", path.display())]
    NotFoundLocally { path: PathBuf },

    /// Local mode: the path exists but is not a git working copy
    #[error("not a git working copy: {}", path.display())]
    NotARepository { path: PathBuf },

    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
}

impl LocateError {
    /// Builds a clone error from tool output, keeping at most
    /// [`MAX_CLONE_MESSAGE`] characters.
    pub fn clone_failed(output: &str) -> Self {
        LocateError::Clone {
            message: output.trim().chars().take(MAX_CLONE_MESSAGE).collect(),
        }
    }
}

/// Failure to read repository URLs from the input table
#[derive(Error, Debug)]
pub enum InputError {
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column '{column}' not found. Available: {available:?}")]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },
}

/// Failure to persist the report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_message_is_truncated() {
        let long = "x".repeat(1000);
        let err = LocateError::clone_failed(&long);
        assert_eq!(err.to_string().chars().count(), MAX_CLONE_MESSAGE);
    }

    #[test]
    fn clone_message_is_trimmed() {
        let err = LocateError::clone_failed("  fatal: repository not found\n");
        assert_eq!(err.to_string(), "fatal: repository not found");
    }

    #[test]
    fn column_not_found_names_both() {
        let err = InputError::ColumnNotFound {
            column: "Github".to_string(),
            available: vec!["Name".to_string(), "Repo".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Github"));
        assert!(msg.contains("Name"));
        assert!(msg.contains("Repo"));
    }

    #[test]
    fn not_found_locally_names_path() {
        let err = LocateError::NotFoundLocally {
            path: PathBuf::from("/cache/foo__bar"),
        };
        assert!(err.to_string().contains("foo__bar"));
    }
}
