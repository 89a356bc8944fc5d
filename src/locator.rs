// src/locator.rs

use crate::error::LocateError;
use crate::process::{CommandOutcome, CommandRunner};
use crate::slug::dir_name;
use git2::Repository;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Serializes writers to the global git config
static SAFE_DIRECTORY_LOCK: Mutex<()> = Mutex::new(());

/// Options for fetching fresh clones
#[derive(Debug, Clone, PartialEq)]
pub struct CloneOptions {
    /// Passed as `--depth` when set; full history otherwise
    pub depth: Option<u32>,
    /// Parent for temporary clones; the system temp dir when `None`
    pub temp_root: Option<PathBuf>,
    /// Persist clones instead of removing them afterwards
    pub keep_workdir: bool,
    /// Add each clone to git's global `safe.directory` list
    pub register_safe_directory: bool,
    pub timeout: Duration,
    /// Clones come from `<clone_base>/<owner>/<name>.git`
    pub clone_base: String,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            depth: None,
            temp_root: None,
            keep_workdir: false,
            register_safe_directory: true,
            timeout: Duration::from_secs(900),
            clone_base: "https://github.com".to_string(),
        }
    }
}

/// Where working copies come from
#[derive(Debug, Clone, PartialEq)]
pub enum LocatorMode {
    /// Clone every repository into a fresh temporary directory
    Remote(CloneOptions),
    /// Resolve `<base>/<owner>__<name>` checkouts that already exist
    Local { base: PathBuf },
}

/// A materialized working copy. The temporary variant deletes its directory
/// when dropped.
#[derive(Debug)]
pub enum WorkingCopy {
    Temporary {
        /// Held only for its drop, which removes the clone
        _dir: TempDir,
        path: PathBuf,
    },
    /// A clone the user asked to keep
    Persisted { path: PathBuf },
    /// A pre-existing checkout that must never be deleted
    Local { path: PathBuf },
}

impl WorkingCopy {
    pub fn path(&self) -> &Path {
        match self {
            WorkingCopy::Temporary { path, .. }
            | WorkingCopy::Persisted { path }
            | WorkingCopy::Local { path } => path,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, WorkingCopy::Temporary { .. })
    }
}

/// Produces a working copy for the `owner/name` slug according to `mode`.
pub fn locate<R: CommandRunner + ?Sized>(
    runner: &R,
    mode: &LocatorMode,
    slug: &str,
) -> Result<WorkingCopy, LocateError> {
    match mode {
        LocatorMode::Remote(options) => clone(runner, options, slug),
        LocatorMode::Local { base } => resolve_local(base, slug),
    }
}

fn clone<R: CommandRunner + ?Sized>(
    runner: &R,
    options: &CloneOptions,
    slug: &str,
) -> Result<WorkingCopy, LocateError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("repo_meta_");
    let dir = match &options.temp_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(LocateError::TempDir)?;

    let path = dir.path().join(dir_name(slug));
    let target = path.to_string_lossy().into_owned();
    let url = clone_url(&options.clone_base, slug);
    let depth = options.depth.map(|d| d.to_string());

    let mut args = vec![
        "-c",
        "protocol.version=2",
        "clone",
        "--no-tags",
        "--single-branch",
    ];
    if let Some(depth) = depth.as_deref() {
        args.extend(["--depth", depth]);
    }
    args.extend([url.as_str(), target.as_str()]);

    info!(url = %url, target = %target, "Cloning");
    let started = Instant::now();
    let outcome = runner.run("git", &args, None, options.timeout);
    if outcome.success_stdout().is_none() {
        // `dir` drops here, removing any partial clone
        return Err(LocateError::clone_failed(&outcome.failure_text()));
    }
    info!(slug, elapsed = ?started.elapsed(), "Cloned");

    if options.register_safe_directory {
        register_safe_directory(runner, &path);
    }

    if options.keep_workdir {
        let kept = dir.keep();
        info!(slug, path = %kept.display(), "Keeping working copy");
        return Ok(WorkingCopy::Persisted { path });
    }
    Ok(WorkingCopy::Temporary { _dir: dir, path })
}

/// Canonical clone URL for a slug, whatever shape the input URL had
pub fn clone_url(base: &str, slug: &str) -> String {
    format!("{}/{slug}.git", base.trim_end_matches('/'))
}

/// Adds `path` to git's global `safe.directory` list. Never fatal.
pub fn register_safe_directory<R: CommandRunner + ?Sized>(runner: &R, path: &Path) {
    let path_str = path.to_string_lossy();
    let _guard = SAFE_DIRECTORY_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let outcome = runner.run(
        "git",
        &["config", "--global", "--add", "safe.directory", &*path_str],
        None,
        Duration::from_secs(30),
    );
    match outcome {
        CommandOutcome::Completed { success: true, .. } => {
            debug!(path = %path_str, "Registered safe.directory");
        }
        other => {
            warn!(path = %path_str, reason = %other.failure_text().trim(), "Could not register safe.directory");
        }
    }
}

fn resolve_local(base: &Path, slug: &str) -> Result<WorkingCopy, LocateError> {
    let path = base.join(dir_name(slug));
    if !path.exists() {
        return Err(LocateError::NotFoundLocally { path });
    }
    if Repository::open(&path).is_err() {
        return Err(LocateError::NotARepository { path });
    }
    Ok(WorkingCopy::Local { path })
}
