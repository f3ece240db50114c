//! Step 8: systemd unit for the backend

use super::StepEnv;
use crate::config::{SERVICE_ACCOUNT, SERVICE_NAME};
use crate::context::Logger;
use crate::error::Result;
use crate::generate::Artifact;
use crate::sequencer::StepStatus;

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let install_dir = env.config()?.install_dir().display().to_string();
    let datastore_unit = env.facts.datastore_unit().to_string();

    env.step("Creating systemd service");
    env.write_artifact(&Artifact::SupervisorUnit {
        datastore_unit: &datastore_unit,
    })?;
    set_ownership(env, &install_dir)?;

    env.tools.services.reload_units(&mut env.exec)?;
    env.tools
        .services
        .enable_and_start(&mut env.exec, SERVICE_NAME)?;

    env.success("Systemd service created and started");
    Ok(StepStatus::Completed)
}

/// Hand the install directory to the service account
pub fn set_ownership(env: &mut StepEnv, install_dir: &str) -> Result<()> {
    let owner = format!("{SERVICE_ACCOUNT}:{SERVICE_ACCOUNT}");
    env.exec
        .run(&["chown", "-R", owner.as_str(), install_dir])?;
    Ok(())
}
