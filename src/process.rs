// src/process.rs

use std::io::Read;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of running one external command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Completed {
        success: bool,
        stdout: String,
        stderr: String,
    },
    /// The command outlived its timeout and was killed
    TimedOut,
    /// The program could not be started at all
    SpawnFailed(String),
}

impl CommandOutcome {
    /// Stdout of a command that exited zero
    pub fn success_stdout(&self) -> Option<&str> {
        match self {
            CommandOutcome::Completed {
                success: true,
                stdout,
                ..
            } => Some(stdout.as_str()),
            _ => None,
        }
    }

    /// Best available diagnostic text for a failed command
    pub fn failure_text(&self) -> String {
        match self {
            CommandOutcome::Completed { stdout, stderr, .. } => {
                if stderr.trim().is_empty() {
                    stdout.clone()
                } else {
                    stderr.clone()
                }
            }
            CommandOutcome::TimedOut => "command timed out".to_string(),
            CommandOutcome::SpawnFailed(reason) => reason.clone(),
        }
    }
}

/// Seam for every external process the analysis runs (git, cloc).
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> CommandOutcome;
}

/// Runs real processes with captured output and a hard timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> CommandOutcome {
        let mut cmd = Command::new(program);
        cmd.args(args)
            // git must never sit on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        // Own process group, so a timeout also reaches helpers such as
        // git-remote-https and index-pack.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return CommandOutcome::SpawnFailed(format!("failed to run {program}: {e}")),
        };

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe while we wait for it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match wait_with_deadline(&mut child, timeout) {
            Ok(Some(status)) => CommandOutcome::Completed {
                success: status.success(),
                stdout: join_output(stdout),
                stderr: join_output(stderr),
            },
            Ok(None) => {
                terminate(&mut child);
                join_output(stdout);
                join_output(stderr);
                CommandOutcome::TimedOut
            }
            Err(e) => {
                terminate(&mut child);
                join_output(stdout);
                join_output(stderr);
                CommandOutcome::SpawnFailed(format!("failed waiting for {program}: {e}"))
            }
        }
    }
}

/// Kills the child's whole process group and reaps the child.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        let _ = child.wait();
        return;
    };
    // SAFETY: plain syscall; the group was created by `process_group(0)` at
    // spawn and its leader is not reaped until the `wait` below.
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_output(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Polls until the child exits or the deadline passes; `None` means timeout.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Whether `program` resolves to a file on `PATH`
pub fn on_path(program: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(program);
        candidate.is_file() || (cfg!(windows) && candidate.with_extension("exe").is_file())
    })
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Runner that answers matching commands from a script and passes
    /// everything else to a fallback runner.
    pub struct ScriptedRunner<F: CommandRunner> {
        rules: Vec<(String, CommandOutcome)>,
        fallback: F,
        calls: Mutex<Vec<String>>,
    }

    impl<F: CommandRunner> ScriptedRunner<F> {
        pub fn new(fallback: F) -> Self {
            Self {
                rules: Vec::new(),
                fallback,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Answer any command line starting with `prefix` (e.g. `"git rev-list"`)
        pub fn on(mut self, prefix: &str, outcome: CommandOutcome) -> Self {
            self.rules.push((prefix.to_string(), outcome));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl<F: CommandRunner> CommandRunner for ScriptedRunner<F> {
        fn run(
            &self,
            program: &str,
            args: &[&str],
            cwd: Option<&Path>,
            timeout: Duration,
        ) -> CommandOutcome {
            let line = format!("{program} {}", args.join(" "));
            self.calls.lock().unwrap().push(line.clone());
            match self.rules.iter().find(|(prefix, _)| line.starts_with(prefix)) {
                Some((_, outcome)) => outcome.clone(),
                None => self.fallback.run(program, args, cwd, timeout),
            }
        }
    }

    /// Fallback that fails every command as if the program were missing
    pub struct NoProcesses;

    impl CommandRunner for NoProcesses {
        fn run(&self, program: &str, _: &[&str], _: Option<&Path>, _: Duration) -> CommandOutcome {
            CommandOutcome::SpawnFailed(format!("{program} not available in tests"))
        }
    }

    pub fn ok(stdout: &str) -> CommandOutcome {
        CommandOutcome::Completed {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn fail(stderr: &str) -> CommandOutcome {
        CommandOutcome::Completed {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}
