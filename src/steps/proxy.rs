//! Step 6: reverse proxy site
//!
//! The site is first written without TLS so the certificate challenge can be
//! served over plain HTTP; [`apply_site`] runs again once a certificate exists.

use super::StepEnv;
use crate::config::{Configuration, SERVICE_NAME, WebServer};
use crate::context::Logger;
use crate::error::Result;
use crate::exec::Invocation;
use crate::generate::{self, Artifact, apache};
use crate::sequencer::StepStatus;

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let config = env.config()?.clone();
    if config.web_server() == WebServer::Standalone {
        return Ok(StepStatus::Skipped(
            "standalone mode serves the application directly".to_string(),
        ));
    }

    env.step(&format!("Configuring {}", config.web_server().display_name()));
    let tls = env.facts.tls_active;
    apply_site(env, &config, tls)?;
    env.success(&format!(
        "{} configured",
        config.web_server().display_name()
    ));
    Ok(StepStatus::Completed)
}

/// Write the site for the configured proxy, enable it, validate and reload
pub fn apply_site(env: &mut StepEnv, config: &Configuration, tls: bool) -> Result<()> {
    match config.web_server() {
        WebServer::Nginx => {
            if let Some(site) = env.write_artifact(&Artifact::ProxySite { tls })? {
                env.layout
                    .replace_symlink(&site, generate::nginx_enabled_path())?;
            }
            env.exec.execute(
                Invocation::new(["nginx", "-t"])
                    .describe("Testing Nginx configuration"),
            )?;
            env.tools.services.reload(&mut env.exec, "nginx")?;
        }
        WebServer::Apache => {
            for module in apache::required_modules(tls && config.enable_ssl()) {
                env.exec.run(&["a2enmod", module])?;
            }
            env.write_artifact(&Artifact::ProxySite { tls })?;
            let site = format!("{SERVICE_NAME}.conf");
            env.exec.run(&["a2ensite", site.as_str()])?;
            env.exec.execute(
                Invocation::new(["apache2ctl", "configtest"])
                    .describe("Testing Apache configuration"),
            )?;
            env.tools.services.reload(&mut env.exec, "apache2")?;
        }
        WebServer::Standalone => {}
    }
    Ok(())
}
