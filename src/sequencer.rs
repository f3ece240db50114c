//! Ordered step execution
//!
//! Runs the plan front to back, reporting progress as it goes. A fatal
//! step's failure aborts the run: no later step is started. An advisory
//! step's failure is logged and the run carries on. A cancellation always
//! aborts, whichever step it came from. A step that ends after an operator
//! interrupt counts as cancelled even if it reported something else.

use crate::context::Logger;
use crate::error::{Result, StagehandError};
use crate::steps::StepEnv;

/// Lines of the run log included in an abort report
pub const ABORT_TAIL_LINES: usize = 10;

type StepAction = Box<dyn FnMut(&mut StepEnv) -> Result<StepStatus>>;

/// How a step that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    /// Not applicable to this configuration
    Skipped(String),
    /// Completed with reduced functionality
    Degraded(String),
}

/// One named unit of the plan
pub struct Step {
    description: String,
    fatal: bool,
    action: StepAction,
}

impl Step {
    /// A step whose failure aborts the run
    pub fn fatal(
        description: impl Into<String>,
        action: impl FnMut(&mut StepEnv) -> Result<StepStatus> + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            fatal: true,
            action: Box::new(action),
        }
    }

    /// A step whose failure is only a warning
    pub fn advisory(
        description: impl Into<String>,
        action: impl FnMut(&mut StepEnv) -> Result<StepStatus> + 'static,
    ) -> Self {
        Self {
            fatal: false,
            ..Self::fatal(description, action)
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

/// Where the sequencer is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Zero-based index of the step being executed
    Running(usize),
    Completed,
    Aborted { step: usize, reason: String },
}

/// What happened to one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped(String),
    Degraded(String),
    /// Advisory step failed; the run continued
    Failed(String),
    /// Fatal failure or cancellation; the run stopped here
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub description: String,
    pub outcome: StepOutcome,
}

/// Summary of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    pub steps: Vec<StepRecord>,
    /// Last lines of the run log when the run aborted
    pub log_tail: Vec<String>,
}

impl RunReport {
    pub fn completed(&self) -> bool {
        self.state == RunState::Completed
    }

    /// The abort reason, if the run aborted
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.state {
            RunState::Aborted { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

pub struct Sequencer {
    steps: Vec<Step>,
    state: RunState,
}

impl Sequencer {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Execute every step in order until the plan ends or a step aborts it
    pub fn run(&mut self, env: &mut StepEnv) -> RunReport {
        let total = self.steps.len();
        let mut records = Vec::with_capacity(total);
        env.exec.ctx_mut().begin(total);
        tracing::debug!(total, "starting run");

        for (index, step) in self.steps.iter_mut().enumerate() {
            self.state = RunState::Running(index);
            env.exec.ctx_mut().advance(step.description());

            let mut result = (step.action)(env);
            if env.exec.interrupted() {
                result = Err(StagehandError::Cancelled);
            }

            let outcome = match result {
                Ok(StepStatus::Completed) => StepOutcome::Completed,
                Ok(StepStatus::Skipped(reason)) => {
                    env.info(&format!("Skipped: {reason}"));
                    StepOutcome::Skipped(reason)
                }
                Ok(StepStatus::Degraded(reason)) => {
                    env.warn(&format!("Completed with limitations: {reason}"));
                    StepOutcome::Degraded(reason)
                }
                Err(e) if e.is_cancellation() => {
                    env.warn("Installation cancelled by user");
                    StepOutcome::Aborted(e.to_string())
                }
                Err(e) if !step.is_fatal() => {
                    env.warn(&format!("{} failed: {e}", step.description));
                    env.warn("Continuing with the remaining steps");
                    StepOutcome::Failed(e.to_string())
                }
                Err(e) => {
                    env.error(&format!("Installation failed: {e}"));
                    StepOutcome::Aborted(e.to_string())
                }
            };
            tracing::debug!(step = %step.description, ?outcome, "step finished");

            let aborted = match &outcome {
                StepOutcome::Aborted(reason) => Some(reason.clone()),
                _ => None,
            };
            records.push(StepRecord {
                description: step.description.clone(),
                outcome,
            });

            if let Some(reason) = aborted {
                self.state = RunState::Aborted {
                    step: index,
                    reason,
                };
                env.exec.ctx_mut().finish(false);
                return RunReport {
                    state: self.state.clone(),
                    steps: records,
                    log_tail: env.exec.ctx().tail(ABORT_TAIL_LINES),
                };
            }
            env.exec.ctx().step_done();
        }

        self.state = RunState::Completed;
        env.exec.ctx_mut().finish(true);
        env.success("Installation completed");
        RunReport {
            state: RunState::Completed,
            steps: records,
            log_tail: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeHost, Reply, ScriptedRunner, http_answers, step_env};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    type Trace = Rc<RefCell<Vec<&'static str>>>;

    fn tracked(
        trace: &Trace,
        name: &'static str,
        fatal: bool,
        result: fn() -> Result<StepStatus>,
    ) -> Step {
        let trace = Rc::clone(trace);
        let action = move |_: &mut StepEnv| {
            trace.borrow_mut().push(name);
            result()
        };
        if fatal {
            Step::fatal(name, action)
        } else {
            Step::advisory(name, action)
        }
    }

    fn ok() -> Result<StepStatus> {
        Ok(StepStatus::Completed)
    }

    fn fail() -> Result<StepStatus> {
        Err(StagehandError::CommandFailed {
            description: "apt-get install -y nginx".to_string(),
            exit_code: "100".to_string(),
        })
    }

    #[test]
    fn test_fatal_failure_stops_later_steps() {
        let temp = TempDir::new().unwrap();
        let mut env = step_env(temp.path(), ScriptedRunner::new(), FakeHost::default(), http_answers());
        let trace = Trace::default();

        let mut sequencer = Sequencer::new(vec![
            tracked(&trace, "one", true, ok),
            tracked(&trace, "two", true, fail),
            tracked(&trace, "three", true, ok),
        ]);
        let report = sequencer.run(&mut env);

        assert_eq!(trace.borrow().as_slice(), ["one", "two"]);
        assert!(matches!(sequencer.state(), RunState::Aborted { step: 1, .. }));
        assert!(!report.completed());
        assert_eq!(report.steps.len(), 2);
        assert!(report.abort_reason().unwrap().contains("apt-get install -y nginx"));
        assert!(!report.log_tail.is_empty());
        assert!(report.log_tail.len() <= ABORT_TAIL_LINES);
    }

    #[test]
    fn test_advisory_failure_continues() {
        let temp = TempDir::new().unwrap();
        let mut env = step_env(temp.path(), ScriptedRunner::new(), FakeHost::default(), http_answers());
        let trace = Trace::default();

        let mut sequencer = Sequencer::new(vec![
            tracked(&trace, "firewall", false, fail),
            tracked(&trace, "tooling", true, ok),
        ]);
        let report = sequencer.run(&mut env);

        assert_eq!(trace.borrow().as_slice(), ["firewall", "tooling"]);
        assert!(report.completed());
        assert!(matches!(report.steps[0].outcome, StepOutcome::Failed(_)));
        assert!(env.exec.ctx().tail(20).iter().any(|l| l.contains("firewall failed")));
    }

    #[test]
    fn test_cancellation_aborts_even_advisory_steps() {
        let temp = TempDir::new().unwrap();
        let mut env = step_env(temp.path(), ScriptedRunner::new(), FakeHost::default(), http_answers());
        let trace = Trace::default();

        let mut sequencer = Sequencer::new(vec![
            tracked(&trace, "collect", false, || Err(StagehandError::Cancelled)),
            tracked(&trace, "install", true, ok),
        ]);
        let report = sequencer.run(&mut env);

        assert_eq!(trace.borrow().as_slice(), ["collect"]);
        assert!(!report.completed());
        assert!(
            report
                .log_tail
                .iter()
                .any(|l| l.contains("Installation cancelled by user"))
        );
    }

    #[test]
    fn test_interrupt_swallowed_by_status_query_still_aborts() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on("ufw status", Reply::Interrupted);
        let mut env = step_env(temp.path(), runner, FakeHost::default(), http_answers());
        let trace = Trace::default();

        let mut sequencer = Sequencer::new(vec![
            Step::advisory("firewall", |env: &mut StepEnv| {
                env.exec.probe(&["ufw", "status"]);
                Ok(StepStatus::Completed)
            }),
            tracked(&trace, "tooling", true, ok),
        ]);
        let report = sequencer.run(&mut env);

        assert!(trace.borrow().is_empty());
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.abort_reason(), Some("Installation cancelled by user"));
        assert!(matches!(sequencer.state(), RunState::Aborted { step: 0, .. }));
    }

    #[test]
    fn test_progress_lines_and_skips() {
        let temp = TempDir::new().unwrap();
        let mut env = step_env(temp.path(), ScriptedRunner::new(), FakeHost::default(), http_answers());

        let mut sequencer = Sequencer::new(vec![
            Step::fatal("first", |_: &mut StepEnv| Ok(StepStatus::Completed)),
            Step::fatal("second", |_: &mut StepEnv| {
                Ok(StepStatus::Skipped("SSL disabled".to_string()))
            }),
        ]);
        let report = sequencer.run(&mut env);

        assert!(report.completed());
        assert_eq!(sequencer.state(), &RunState::Completed);
        let log = env.exec.ctx().tail(20).join("\n");
        assert!(log.contains("PROGRESS: Step 1/2: first"));
        assert!(log.contains("PROGRESS: Step 2/2: second"));
        assert!(log.contains("Skipped: SSL disabled"));
    }
}
