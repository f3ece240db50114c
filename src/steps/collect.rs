//! Step 3: obtain the validated configuration

use super::StepEnv;
use crate::context::Logger;
use crate::error::{Result, StagehandError};
use crate::sequencer::StepStatus;
use crate::ui::summary;

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    if env.collected().is_some() {
        return Ok(StepStatus::Skipped(
            "configuration already collected".to_string(),
        ));
    }

    let config = env.config_source.collect(&mut env.exec)?;

    env.step("Configuration summary");
    for (label, value) in summary::configuration_rows(&config) {
        env.info(&format!("{label}: {value}"));
    }

    if !env.config_source.confirm(&config)? {
        return Err(StagehandError::Cancelled);
    }

    env.facts.tls_active = false;
    env.config = Some(config);
    env.success("Configuration collected");
    Ok(StepStatus::Completed)
}
