//! Step 9: host firewall; advisory, a failure leaves the host reachable but unfiltered

use super::StepEnv;
use crate::config::{APP_PORT, WebServer};
use crate::context::Logger;
use crate::error::Result;
use crate::sequencer::StepStatus;

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let web_server = env.config()?.web_server();

    env.step("Configuring firewall");
    env.tools
        .firewall
        .install(&mut env.exec, env.tools.packages.as_ref())?;
    env.tools.firewall.reset_to_defaults(&mut env.exec)?;

    for rule in rules(web_server, env.facts.tls_active) {
        env.tools.firewall.allow(&mut env.exec, &rule)?;
    }
    env.tools.firewall.enable(&mut env.exec)?;

    env.success("Firewall configured");
    Ok(StepStatus::Completed)
}

/// Inbound rules for a deployment
pub fn rules(web_server: WebServer, tls_active: bool) -> Vec<String> {
    let mut rules = vec!["ssh".to_string(), "22/tcp".to_string(), "80/tcp".to_string()];
    if tls_active {
        rules.push("443/tcp".to_string());
    }
    // Without a proxy clients talk to the application port directly
    if web_server == WebServer::Standalone {
        rules.push(format!("{APP_PORT}/tcp"));
    }
    rules
}
