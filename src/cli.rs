// src/cli.rs

use crate::analyzer::AnalysisConfig;
use crate::locator::{CloneOptions, LocatorMode};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV file listing the repositories
    #[arg(short, long)]
    pub input: PathBuf,

    /// Report to write (.csv, or .json for a JSON array)
    #[arg(short, long, default_value = "repo_metadata.csv")]
    pub output: PathBuf,

    /// Header of the column holding repository URLs
    #[arg(long, default_value = "Github")]
    pub column: String,

    /// Number of repositories analyzed in parallel (default: CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Where working copies come from
    #[arg(long, value_enum, default_value_t = Mode::Remote)]
    pub mode: Mode,

    /// Directory holding `<owner>__<name>` checkouts for local mode
    #[arg(long, required_if_eq("mode", "local"))]
    pub local_base: Option<PathBuf>,

    /// Directory for temporary clones (default: system temp dir)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Timeout for each git query and line count, in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Timeout for each clone, in seconds
    #[arg(long, default_value_t = 900)]
    pub clone_timeout_secs: u64,

    /// Shallow clone depth; full history when omitted
    #[arg(long)]
    pub depth: Option<u32>,

    /// Keep cloned working copies instead of deleting them
    #[arg(long)]
    pub keep_workdir: bool,

    /// Do not add clones to git's global safe.directory list
    #[arg(long)]
    pub no_safe_directory: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq)]
pub enum Mode {
    /// Clone each repository into a temporary directory
    Remote,
    /// Use checkouts already present under --local-base
    Local,
}

impl Args {
    pub fn to_config(&self) -> AnalysisConfig {
        let mode = match (self.mode, &self.local_base) {
            (Mode::Local, Some(base)) => LocatorMode::Local { base: base.clone() },
            // clap enforces --local-base for local mode
            (Mode::Local, None) => LocatorMode::Local {
                base: PathBuf::from("."),
            },
            (Mode::Remote, _) => LocatorMode::Remote(CloneOptions {
                depth: self.depth,
                temp_root: self.work_dir.clone(),
                keep_workdir: self.keep_workdir,
                register_safe_directory: !self.no_safe_directory,
                timeout: Duration::from_secs(self.clone_timeout_secs),
                ..CloneOptions::default()
            }),
        };
        AnalysisConfig {
            mode,
            query_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
