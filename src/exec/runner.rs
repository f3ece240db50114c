//! Process spawning
//!
//! `CommandRunner` is the only place a child process is created. The real
//! implementation blocks until the child exits, its time budget runs out, or
//! the operator interrupts the run; tests substitute a scripted runner.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One process to start
pub struct RunRequest<'a> {
    pub argv: &'a [String],
    pub cwd: Option<&'a Path>,
    /// Return stdout/stderr to the caller instead of streaming them
    pub capture: bool,
    /// Where streamed output goes; discarded when `None`
    pub stream_to: Option<File>,
    pub timeout: Duration,
}

/// What happened to a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Exited {
        /// `None` when the child was killed by a signal
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    NotFound,
    TimedOut,
    /// The operator interrupted the run; the child was stopped
    Interrupted,
    SpawnFailed(String),
}

impl RunOutcome {
    pub fn success(stdout: impl Into<String>) -> Self {
        RunOutcome::Exited {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32) -> Self {
        RunOutcome::Exited {
            code: Some(code),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Starts processes and waits for them
pub trait CommandRunner {
    fn run(&mut self, request: RunRequest<'_>) -> RunOutcome;

    /// Whether the operator has asked the run to stop
    fn interrupted(&self) -> bool {
        false
    }
}

/// Raised when the operator presses Ctrl-C
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Route SIGINT to this flag instead of terminating the process
    pub fn install(&self) -> std::result::Result<(), ctrlc::Error> {
        let flag = Arc::clone(&self.0);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
    }

    #[cfg(test)]
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs real processes on the host
#[derive(Debug, Default)]
pub struct SystemRunner {
    interrupt: Interrupt,
}

impl SystemRunner {
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }
}

impl CommandRunner for SystemRunner {
    fn interrupted(&self) -> bool {
        self.interrupt.is_raised()
    }

    fn run(&mut self, request: RunRequest<'_>) -> RunOutcome {
        let Some((program, args)) = request.argv.split_first() else {
            return RunOutcome::SpawnFailed("empty command".to_string());
        };

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());
        if let Some(dir) = request.cwd {
            cmd.current_dir(dir);
        }

        let spools = match wire_output(&mut cmd, request.capture, request.stream_to) {
            Ok(spools) => spools,
            Err(e) => return RunOutcome::SpawnFailed(format!("could not prepare output: {e}")),
        };

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return RunOutcome::NotFound,
            Err(e) => return RunOutcome::SpawnFailed(e.to_string()),
        };

        let deadline = Instant::now() + request.timeout;
        let code = loop {
            if self.interrupt.is_raised() {
                let _ = child.kill();
                let _ = child.wait();
                tracing::debug!(program = %program, "stopped on interrupt");
                return RunOutcome::Interrupted;
            }
            match child.try_wait() {
                // The terminal delivers SIGINT to the child as well
                Ok(Some(_)) if self.interrupt.is_raised() => return RunOutcome::Interrupted,
                Ok(Some(status)) => break status.code(),
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::debug!(program = %program, "killed after exceeding time budget");
                    return RunOutcome::TimedOut;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return RunOutcome::SpawnFailed(e.to_string()),
            }
        };

        let (stdout, stderr) = match spools {
            Some((mut out, mut err)) => (drain(&mut out), drain(&mut err)),
            None => (String::new(), String::new()),
        };

        RunOutcome::Exited {
            code,
            stdout,
            stderr,
        }
    }
}

/// Point the child's stdout/stderr at spool files, the run log, or nowhere
fn wire_output(
    cmd: &mut Command,
    capture: bool,
    stream_to: Option<File>,
) -> std::io::Result<Option<(File, File)>> {
    if capture {
        let out = tempfile::tempfile()?;
        let err = tempfile::tempfile()?;
        cmd.stdout(out.try_clone()?).stderr(err.try_clone()?);
        return Ok(Some((out, err)));
    }

    match stream_to {
        Some(log) => {
            cmd.stdout(log.try_clone()?).stderr(log);
        }
        None => {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
    }
    Ok(None)
}

fn drain(spool: &mut File) -> String {
    let mut bytes = Vec::new();
    if spool.seek(SeekFrom::Start(0)).is_ok() {
        let _ = spool.read_to_end(&mut bytes);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
