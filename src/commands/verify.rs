//! Verify command implementation
//!
//! Runs the same verification pass the installer ends with against an
//! existing deployment. Without `--strict` failures are reported only.

use crate::cli::VerifyArgs;
use crate::config::Configuration;
use crate::context::RunContext;
use crate::error::{Result, StagehandError};
use crate::exec::{Executor, SystemRunner};
use crate::system::Layout;
use crate::system::systemd::Systemd;
use crate::ui;
use crate::verify::{LiveNetwork, ProbeOptions, VerificationTargets, Verifier};

/// Run verify command
pub fn run(args: VerifyArgs) -> Result<()> {
    let config = deployment(&args)?;
    let ctx = if args.json {
        RunContext::detached().quiet()
    } else {
        RunContext::detached()
    };
    let mut exec = Executor::new(Box::new(SystemRunner::default()), ctx);

    let report = Verifier {
        exec: &mut exec,
        services: &Systemd,
        network: &LiveNetwork,
        layout: &Layout::host(),
        options: ProbeOptions::default(),
    }
    .verify(&VerificationTargets::for_install(&config));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ui::report::print_verification(&report);
    }

    if args.strict && !report.all_passed() {
        return Err(StagehandError::VerificationFailed {
            failed: report.failed(),
        });
    }
    Ok(())
}

/// The deployment being verified
///
/// Only the web server and install directory matter here, so the domain
/// defaults to localhost and certificate settings are ignored.
fn deployment(args: &VerifyArgs) -> Result<Configuration> {
    let mut answers = args.config.answers()?;
    answers.domain.get_or_insert_with(|| "localhost".to_string());
    answers.enable_ssl = Some(false);
    answers
        .to_builder()
        .ok_or_else(|| StagehandError::ConfigInvalid {
            message: "no domain was provided".to_string(),
        })?
        .build()
}
