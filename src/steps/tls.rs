//! Step 7: certificate acquisition
//!
//! A failure here does not abort the run. The deployment falls back to plain
//! HTTP and the operator can request a certificate by hand later.

use super::{StepEnv, proxy};
use crate::context::Logger;
use crate::error::{Result, StagehandError};
use crate::generate::Artifact;
use crate::sequencer::StepStatus;

/// Served from the webroot until the real frontend build replaces it
const PLACEHOLDER_PAGE: &str = "<html><body><h1>Secret Poll Setup</h1></body></html>\n";

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let config = env.config()?.clone();
    if !config.enable_ssl() {
        return Ok(StepStatus::Skipped("SSL disabled, serving HTTP only".to_string()));
    }
    let email = config
        .ssl_email()
        .ok_or_else(|| StagehandError::ConfigInvalid {
            message: "SSL is enabled but no email was provided".to_string(),
        })?
        .to_string();

    env.step("Setting up SSL certificates");
    env.tools
        .certificates
        .install(&mut env.exec, env.tools.packages.as_ref(), config.web_server())?;

    match env.host.resolve(config.domain()) {
        Some(address) => env.success(&format!("Domain {} resolves to {address}", config.domain())),
        None => {
            env.warn(&format!("DNS resolution failed for {}", config.domain()));
            env.warn("Certificate issuance will fail unless the domain points to this server");
        }
    }

    let webroot = config.build_dir();
    env.layout.create_dir_all(&webroot)?;
    let index = webroot.join("index.html");
    if !env.layout.exists(&index) {
        env.layout.write(&index, PLACEHOLDER_PAGE, None)?;
    }

    let obtained = env
        .tools
        .certificates
        .obtain(&mut env.exec, &webroot, config.domain(), &email);
    if let Err(e) = obtained {
        if e.is_cancellation() {
            return Err(e);
        }
        env.facts.tls_active = false;
        env.warn(&format!("SSL certificate generation failed: {e}"));
        env.warn("HTTPS will be disabled. You can run 'certbot certonly' manually later.");
        env.warn(&format!(
            "The frontend was built for {}; rebuild it once a certificate is in place",
            config.public_url(true)
        ));
        return Ok(StepStatus::Degraded("serving HTTP only".to_string()));
    }

    env.facts.tls_active = true;
    env.success("SSL certificate obtained");

    env.write_artifact(&Artifact::RenewalScript)?;
    env.success("SSL auto-renewal configured");

    proxy::apply_site(env, &config, true)?;

    let certificate = config.cert_dir().join("fullchain.pem");
    match env
        .tools
        .certificates
        .certificate_dates(&mut env.exec, &certificate)
    {
        Some(dates) => {
            env.info("SSL certificate details:");
            for line in dates {
                env.info(&format!("  {line}"));
            }
        }
        None => env.warn("Could not read certificate details"),
    }

    env.success("SSL certificates configured successfully");
    Ok(StepStatus::Completed)
}
