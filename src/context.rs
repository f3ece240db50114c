//! Run-scoped context: the append-only run log and the step counters
//!
//! One `RunContext` exists per installation run and is handed to every
//! component that needs to report something. Each entry is written to the log
//! file as `[<timestamp>] <LEVEL>: <message>` and echoed to the terminal.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use console::Style;

use crate::progress::ProgressDisplay;

/// Default location of the installation log
pub const DEFAULT_LOG_FILE: &str = "/var/log/secret-poll-install.log";

/// Severity of a run log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
    Progress,
    Step,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Progress => "PROGRESS",
            Level::Step => "STEP",
        }
    }

    fn style(self) -> Style {
        match self {
            Level::Info => Style::new().cyan(),
            Level::Success => Style::new().green(),
            Level::Warning => Style::new().yellow(),
            Level::Error => Style::new().red(),
            Level::Progress => Style::new().bold(),
            Level::Step => Style::new().blue().bold(),
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Level::Info => "i",
            Level::Success => "✓",
            Level::Warning => "!",
            Level::Error => "✗",
            Level::Progress => "»",
            Level::Step => "▶",
        }
    }
}

/// Anything that can append to the run log
pub trait Logger {
    fn log(&mut self, level: Level, message: &str);

    fn info(&mut self, message: &str) {
        self.log(Level::Info, message);
    }

    fn success(&mut self, message: &str) {
        self.log(Level::Success, message);
    }

    fn warn(&mut self, message: &str) {
        self.log(Level::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.log(Level::Error, message);
    }

    fn step(&mut self, message: &str) {
        self.log(Level::Step, message);
    }
}

/// Log file, terminal echo and progress counters for one run
pub struct RunContext {
    log_path: PathBuf,
    file: Option<File>,
    echo: bool,
    current_step: usize,
    total_steps: usize,
    progress: Option<ProgressDisplay>,
}

impl RunContext {
    /// Open (or create) the run log for appending
    ///
    /// A log that cannot be opened is reported once on stderr; the run
    /// continues and file writes become no-ops.
    pub fn open(log_path: impl Into<PathBuf>) -> Self {
        let log_path = log_path.into();
        let file = match open_append(&log_path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!(
                    "{} Could not open log file {}: {}",
                    Style::new().yellow().apply_to("Warning:"),
                    log_path.display(),
                    e
                );
                None
            }
        };

        Self {
            log_path,
            file,
            echo: true,
            current_step: 0,
            total_steps: 0,
            progress: None,
        }
    }

    /// Terminal-only context for commands that keep no run log
    pub fn detached() -> Self {
        Self {
            log_path: PathBuf::new(),
            file: None,
            echo: true,
            current_step: 0,
            total_steps: 0,
            progress: None,
        }
    }

    /// Disable terminal output; the log file is still written
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// A handle child processes can write their output into
    pub fn stream_target(&self) -> Option<&File> {
        self.file.as_ref()
    }

    /// Write a line to the log file only
    pub fn record(&mut self, level: Level, message: &str) {
        if let Some(file) = self.file.as_mut() {
            let line = format_entry(&timestamp(), level, message);
            // A full disk must not take the installer down with it
            let _ = writeln!(file, "{line}");
        }
    }

    /// Reset counters at the start of a run
    pub fn begin(&mut self, total_steps: usize) {
        self.current_step = 0;
        self.total_steps = total_steps;
        if self.echo {
            self.progress = Some(ProgressDisplay::new(total_steps as u64));
        }
    }

    /// Advance to the next top-level step and report it
    pub fn advance(&mut self, description: &str) -> (usize, usize) {
        self.current_step += 1;
        let (current, total) = (self.current_step, self.total_steps);

        self.record(
            Level::Progress,
            &format!("Step {current}/{total}: {description}"),
        );
        if self.echo {
            let header = format!("\n[{current}/{total}] {description}");
            self.print(&Style::new().bold().apply_to(header).to_string());
        }
        if let Some(progress) = &self.progress {
            progress.start_step(description, current);
        }

        (current, total)
    }

    /// Mark the current step as done on the progress bar
    pub fn step_done(&self) {
        if let Some(progress) = &self.progress {
            progress.finish_step(self.current_step);
        }
    }

    /// Close the progress bar at the end of a run
    pub fn finish(&mut self, completed: bool) {
        if let Some(progress) = self.progress.take() {
            if completed {
                progress.finish();
            } else {
                progress.abandon();
            }
        }
    }

    #[cfg(test)]
    pub fn progress(&self) -> (usize, usize) {
        (self.current_step, self.total_steps)
    }

    /// The last `n` lines of the log file
    pub fn tail(&self, n: usize) -> Vec<String> {
        let Ok(file) = File::open(&self.log_path) else {
            return Vec::new();
        };
        let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].to_vec()
    }

    fn print(&self, line: &str) {
        match &self.progress {
            Some(progress) => progress.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

impl Logger for RunContext {
    fn log(&mut self, level: Level, message: &str) {
        self.record(level, message);
        tracing::trace!(level = level.as_str(), "{message}");

        if self.echo {
            let style = level.style();
            let line = format!("{} {}", style.apply_to(level.marker()), style.apply_to(message));
            if level == Level::Error {
                eprintln!("{line}");
            } else {
                self.print(&line);
            }
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn format_entry(timestamp: &str, level: Level, message: &str) -> String {
    format!("[{timestamp}] {}: {message}", level.as_str())
}
