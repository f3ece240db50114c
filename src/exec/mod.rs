//! Command execution with centralized failure policy
//!
//! Every external command of a run goes through [`Executor::execute`]. The
//! caller declares up front whether a failure is tolerable
//! ([`Invocation::ignore_errors`]); the executor logs accordingly and either
//! hands back a failed-but-ignored [`CommandResult`] or an error that the
//! sequencer turns into an abort. An operator interrupt is never tolerable.

pub mod runner;

use std::path::PathBuf;
use std::time::Duration;

use crate::context::{Level, Logger, RunContext};
use crate::error::{Result, StagehandError};

pub use runner::{CommandRunner, Interrupt, RunOutcome, RunRequest, SystemRunner};

/// Time budget for a single command
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(30 * 60);

/// A command to run and how to treat its failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
    description: Option<String>,
    capture: bool,
    ignore_errors: bool,
    quiet: bool,
    cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            description: None,
            capture: false,
            ignore_errors: false,
            quiet: false,
            cwd: None,
        }
    }

    /// Human-readable description, logged before the command runs
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Return stdout to the caller instead of streaming it to the run log
    #[must_use]
    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// A failure is logged as a warning and the run continues
    #[must_use]
    pub fn ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }

    /// A status query: captured, failure tolerated and not reported
    #[must_use]
    pub fn probe(mut self) -> Self {
        self.capture = true;
        self.ignore_errors = true;
        self.quiet = true;
        self
    }

    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// Outcome of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub argv: Vec<String>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub succeeded: bool,
    /// The command failed and the caller had declared that tolerable
    pub ignored: bool,
}

impl CommandResult {
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Runs commands on behalf of the installation steps
pub struct Executor {
    runner: Box<dyn CommandRunner>,
    ctx: RunContext,
    budget: Duration,
}

impl Executor {
    pub fn new(runner: Box<dyn CommandRunner>, ctx: RunContext) -> Self {
        Self {
            runner,
            ctx,
            budget: DEFAULT_BUDGET,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn ctx(&self) -> &RunContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut RunContext {
        &mut self.ctx
    }

    pub fn interrupted(&self) -> bool {
        self.runner.interrupted()
    }

    /// Run a command, applying the invocation's failure policy
    pub fn execute(&mut self, invocation: Invocation) -> Result<CommandResult> {
        if invocation.argv.is_empty() {
            return Err(StagehandError::EmptyCommand);
        }

        let command_line = invocation.command_line();
        if self.runner.interrupted() {
            self.ctx
                .record(Level::Warning, &format!("Not started after interrupt: {command_line}"));
            return Err(StagehandError::Cancelled);
        }
        if let Some(description) = &invocation.description {
            self.info(description);
        }
        self.ctx.record(Level::Info, &format!("Running: {command_line}"));
        tracing::debug!(command = %command_line, capture = invocation.capture, "executing");

        let stream_to = if invocation.capture {
            None
        } else {
            self.ctx.stream_target().and_then(|f| f.try_clone().ok())
        };

        let outcome = self.runner.run(RunRequest {
            argv: &invocation.argv,
            cwd: invocation.cwd.as_deref(),
            capture: invocation.capture,
            stream_to,
            timeout: self.budget,
        });

        let (exit_code, stdout, stderr) = match &outcome {
            RunOutcome::Exited {
                code,
                stdout,
                stderr,
            } => (*code, stdout.clone(), stderr.clone()),
            _ => (None, String::new(), String::new()),
        };
        let succeeded = exit_code == Some(0);

        self.ctx.record(
            Level::Info,
            &format!("Finished: {command_line} ({})", describe_outcome(&outcome)),
        );
        tracing::debug!(command = %command_line, ?exit_code, succeeded, "finished");

        if outcome == RunOutcome::Interrupted {
            return Err(StagehandError::Cancelled);
        }

        let mut result = CommandResult {
            argv: invocation.argv.clone(),
            exit_code,
            stdout,
            stderr,
            succeeded,
            ignored: false,
        };
        if succeeded {
            return Ok(result);
        }

        let headline = failure_headline(&invocation, &outcome);
        let detail = describe_outcome(&outcome);

        if invocation.ignore_errors {
            if invocation.quiet {
                self.ctx
                    .record(Level::Warning, &format!("{headline} ({detail})"));
            } else {
                self.warn(&headline);
                self.warn(&capitalize(&detail));
                self.warn("Continuing despite error");
            }
            result.ignored = true;
            return Ok(result);
        }

        self.error(&headline);
        if !matches!(outcome, RunOutcome::NotFound) {
            self.error(&capitalize(&detail));
        }
        Err(classify(&invocation, &outcome, self.budget))
    }

    /// Run a command that must succeed
    pub fn run<S: AsRef<str>>(&mut self, argv: &[S]) -> Result<CommandResult> {
        self.execute(Invocation::new(argv.iter().map(AsRef::as_ref)))
    }

    /// Run a command that must succeed and return its trimmed stdout
    pub fn output<S: AsRef<str>>(&mut self, argv: &[S]) -> Result<String> {
        let result = self.execute(Invocation::new(argv.iter().map(AsRef::as_ref)).capture())?;
        Ok(result.stdout_trimmed().to_string())
    }

    /// Run a status query; never fails the run
    pub fn probe<S: AsRef<str>>(&mut self, argv: &[S]) -> CommandResult {
        let invocation = Invocation::new(argv.iter().map(AsRef::as_ref)).probe();
        match self.execute(invocation.clone()) {
            Ok(result) => result,
            // Empty argv or an interrupt; the next fatal command reports the latter
            Err(_) => CommandResult {
                argv: invocation.argv,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                succeeded: false,
                ignored: true,
            },
        }
    }
}

impl Logger for Executor {
    fn log(&mut self, level: Level, message: &str) {
        self.ctx.log(level, message);
    }
}

fn failure_headline(invocation: &Invocation, outcome: &RunOutcome) -> String {
    if matches!(outcome, RunOutcome::NotFound) {
        return format!("Command not found: {}", invocation.argv[0]);
    }
    match &invocation.description {
        Some(description) => format!("{description} failed"),
        None => format!("Command failed: {}", invocation.command_line()),
    }
}

fn describe_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Exited { code: Some(c), .. } => format!("exit code: {c}"),
        RunOutcome::Exited { code: None, .. } => "terminated by signal".to_string(),
        RunOutcome::NotFound => "command not found".to_string(),
        RunOutcome::TimedOut => "timed out".to_string(),
        RunOutcome::Interrupted => "interrupted".to_string(),
        RunOutcome::SpawnFailed(reason) => format!("could not start: {reason}"),
    }
}

fn classify(invocation: &Invocation, outcome: &RunOutcome, budget: Duration) -> StagehandError {
    let description = invocation
        .description
        .clone()
        .unwrap_or_else(|| invocation.command_line());

    match outcome {
        RunOutcome::NotFound => StagehandError::CommandNotFound {
            program: invocation.argv[0].clone(),
        },
        RunOutcome::TimedOut => StagehandError::CommandTimedOut {
            command: invocation.command_line(),
            seconds: budget.as_secs(),
        },
        RunOutcome::Interrupted => StagehandError::Cancelled,
        RunOutcome::Exited { code, .. } => StagehandError::CommandFailed {
            description,
            exit_code: code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
        },
        RunOutcome::SpawnFailed(reason) => StagehandError::CommandFailed {
            description,
            exit_code: reason.clone(),
        },
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
