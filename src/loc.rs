// src/loc.rs

use crate::process::{on_path, CommandRunner};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Extensions never counted by the fallback counter
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "pdf", "zip", "gz", "tar", "7z", "exe", "dll",
    "so", "dylib", "bin", "mp4", "mov", "avi", "mkv", "ogg", "mp3", "wav", "flac", "ico", "ttf",
    "otf",
];

#[derive(Deserialize)]
struct ClocReport {
    #[serde(rename = "SUM")]
    sum: ClocSum,
}

#[derive(Deserialize)]
struct ClocSum {
    code: u64,
}

/// Total lines of code in a working copy. Uses `cloc` when it is installed
/// and falls back to counting newlines in tracked, non-binary files.
pub fn count_lines<R: CommandRunner + ?Sized>(
    runner: &R,
    repo_dir: &Path,
    timeout: Duration,
) -> Option<u64> {
    if on_path("cloc") {
        if let Some(total) = count_with_cloc(runner, repo_dir, timeout) {
            info!(repo = %repo_dir.display(), total, "LOC via cloc");
            return Some(total);
        }
    }
    let total = count_tracked_files(runner, repo_dir, timeout);
    if let Some(total) = total {
        info!(repo = %repo_dir.display(), total, "LOC via line scan");
    }
    total
}

pub fn count_with_cloc<R: CommandRunner + ?Sized>(
    runner: &R,
    repo_dir: &Path,
    timeout: Duration,
) -> Option<u64> {
    let outcome = runner.run(
        "cloc",
        &["--json", "--quiet", "--git", "."],
        Some(repo_dir),
        timeout,
    );
    let Some(stdout) = outcome.success_stdout() else {
        debug!(repo = %repo_dir.display(), reason = %outcome.failure_text().trim(), "cloc failed");
        return None;
    };
    parse_cloc_json(stdout)
}

pub fn parse_cloc_json(output: &str) -> Option<u64> {
    serde_json::from_str::<ClocReport>(output)
        .map(|report| report.sum.code)
        .ok()
}

/// Sums newline counts over `git ls-files`, skipping binary extensions and
/// files that cannot be read.
pub fn count_tracked_files<R: CommandRunner + ?Sized>(
    runner: &R,
    repo_dir: &Path,
    timeout: Duration,
) -> Option<u64> {
    let outcome = runner.run("git", &["ls-files", "-z"], Some(repo_dir), timeout);
    let Some(listing) = outcome.success_stdout() else {
        debug!(repo = %repo_dir.display(), reason = %outcome.failure_text().trim(), "git ls-files failed");
        return None;
    };

    let total = listing
        .split('\0')
        .filter(|rel| !rel.is_empty())
        .filter(|rel| !is_binary_path(Path::new(rel)))
        .filter_map(|rel| count_newlines(&repo_dir.join(rel)).ok())
        .sum();
    Some(total)
}

/// Case-insensitive match against the binary extension denylist
pub fn is_binary_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            BINARY_EXTENSIONS
                .iter()
                .any(|bin| bin.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Number of `\n` bytes in a file, like `wc -l`
pub fn count_newlines(path: &Path) -> io::Result<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = [0u8; 64 * 1024];
    let mut count = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(count);
        }
        count += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
    }
}
