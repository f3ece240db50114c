//! Step 11: advisory post-install verification

use super::StepEnv;
use crate::context::Logger;
use crate::error::Result;
use crate::sequencer::StepStatus;
use crate::verify::{VerificationTargets, Verifier};

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let targets = VerificationTargets::for_install(env.config()?);

    env.step("Verifying installation");
    env.settle(env.timings.verification_delay);

    let report = Verifier {
        exec: &mut env.exec,
        services: env.tools.services.as_ref(),
        network: env.network.as_ref(),
        layout: &env.layout,
        options: env.timings.probes,
    }
    .verify(&targets);

    let status = if report.all_passed() {
        env.success(&format!(
            "All {} verification checks passed",
            report.items.len()
        ));
        StepStatus::Completed
    } else {
        let summary = format!(
            "{} of {} verification checks failed",
            report.failed(),
            report.items.len()
        );
        env.warn(&summary);
        StepStatus::Degraded(summary)
    };
    env.facts.verification = Some(report);
    Ok(status)
}
