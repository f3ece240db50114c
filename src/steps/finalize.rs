//! Step 12: final ownership, service start and health probe

use super::{StepEnv, supervisor};
use crate::config::{APP_PORT, HEALTH_PATH, SERVICE_NAME};
use crate::context::Logger;
use crate::error::Result;
use crate::sequencer::StepStatus;
use crate::system::ServiceAction;

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let config = env.config()?.clone();

    env.step("Starting services");
    supervisor::set_ownership(env, &config.install_dir().display().to_string())?;

    let mut units = vec![SERVICE_NAME];
    units.extend(config.web_server().service());
    for unit in units {
        let enabled = env
            .tools
            .services
            .control(&mut env.exec, ServiceAction::Enable, unit, true)?;
        let started = env
            .tools
            .services
            .control(&mut env.exec, ServiceAction::Start, unit, true)?;
        if enabled.succeeded && started.succeeded {
            env.success(&format!("{unit} service started"));
        } else {
            env.warn(&format!("{unit} service may not be running"));
        }
    }

    env.settle(env.timings.service_settle);

    let timeout = env.timings.probes.timeout;
    let health_url = format!("http://localhost:{APP_PORT}{HEALTH_PATH}");
    let healthy = matches!(env.network.http_status(&health_url, timeout), Ok(200));
    if healthy {
        env.success("Backend health check passed");
    } else {
        env.warn("Backend health check failed; check the service logs");
    }

    if config.web_server().service().is_some() {
        match env.network.http_status("http://localhost/", timeout) {
            Ok(200 | 404) => env.success("Web server responding"),
            Ok(status) => env.warn(&format!("Web server answered with HTTP {status}")),
            Err(reason) => env.warn(&format!("Web server not responding: {reason}")),
        }
    }

    env.success("Installation finalized");
    Ok(StepStatus::Completed)
}
