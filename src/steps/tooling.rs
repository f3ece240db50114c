//! Step 10: operator scripts in the install directory

use super::StepEnv;
use crate::context::Logger;
use crate::error::Result;
use crate::generate::Artifact;
use crate::sequencer::StepStatus;

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let datastore_unit = env.facts.datastore_unit().to_string();

    env.step("Creating management tools");
    for artifact in [
        Artifact::StatusScript {
            datastore_unit: &datastore_unit,
        },
        Artifact::LogsScript,
        Artifact::RestartScript,
    ] {
        if let Some(path) = env.write_artifact(&artifact)? {
            env.info(&format!("Created {}", path.display()));
        }
    }

    env.success("Management tools created");
    Ok(StepStatus::Completed)
}
