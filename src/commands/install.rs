//! Install command implementation
//!
//! The installation process:
//! 1. Gather answers from the answers file and flags, rejecting bad values early
//! 2. Open the run log and wire the live host backends into a step environment,
//!    routing Ctrl-C into the runner so an interrupt aborts like a fatal error
//! 3. Run the twelve-step plan through the sequencer
//! 4. Print the completion summary, or the abort report with the log tail

use std::io::IsTerminal;
use std::path::PathBuf;

use crate::cli::InstallArgs;
use crate::config::{
    Answers, ConfigSource, DEFAULT_INSTALL_DIR, InteractiveSource, PresetSource, validate,
};
use crate::context::{Logger, RunContext};
use crate::error::{Result, StagehandError};
use crate::exec::{Executor, Interrupt, SystemRunner};
use crate::sequencer::Sequencer;
use crate::steps::{self, StepEnv, Timings};
use crate::system::{Layout, SystemHost, Toolbox};
use crate::ui;
use crate::verify::LiveNetwork;

/// Run install command
pub fn run(args: InstallArgs) -> Result<()> {
    let answers = args.config.answers()?;
    let source = config_source(answers.clone(), args.yes, std::io::stdin().is_terminal())?;
    let install_dir = answers
        .install_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_DIR));
    validate::validate_install_dir(&install_dir)?;

    let interrupt = Interrupt::default();
    if let Err(e) = interrupt.install() {
        tracing::warn!(error = %e, "could not install the Ctrl-C handler");
    }
    let exec = Executor::new(
        Box::new(SystemRunner::new(interrupt)),
        RunContext::open(&args.log_file),
    );
    let mut env = StepEnv::new(
        exec,
        Toolbox::system(),
        Box::new(SystemHost),
        Box::new(LiveNetwork),
        Layout::host(),
        Timings::default(),
        source,
        install_dir,
        args.source_dir,
    );
    env.step(&format!(
        "Secret Poll installer {} starting",
        env!("CARGO_PKG_VERSION")
    ));
    tracing::debug!(log = %args.log_file.display(), "install run starting");

    let mut sequencer = Sequencer::new(steps::plan());
    let report = sequencer.run(&mut env);
    tracing::debug!(state = ?sequencer.state(), "install run finished");
    let log_path = env.exec.ctx().log_path().to_path_buf();

    if report.completed() {
        if let Some(config) = env.collected() {
            ui::summary::print_completion(config, &env.facts, &log_path);
        }
        return Ok(());
    }

    ui::summary::print_abort(&report, &log_path);
    Err(StagehandError::Aborted {
        reason: report
            .abort_reason()
            .unwrap_or("unknown failure")
            .to_string(),
    })
}

/// Pick the configuration source, failing before anything touches the host
///
/// A known domain means the run is preset; its values are validated right
/// away. Without one the operator is prompted, which needs a terminal.
fn config_source(
    answers: Answers,
    assume_yes: bool,
    interactive_terminal: bool,
) -> Result<Box<dyn ConfigSource>> {
    match answers.to_builder() {
        Some(builder) => {
            builder.build()?;
            Ok(Box::new(PresetSource::new(answers, assume_yes)))
        }
        None if interactive_terminal => Ok(Box::new(InteractiveSource::new(answers, assume_yes))),
        None => Err(StagehandError::ConfigInvalid {
            message: "no domain given and stdin is not a terminal; pass --domain or --answers"
                .to_string(),
        }),
    }
}
