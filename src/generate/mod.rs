//! Configuration artifacts derived from a [`Configuration`]
//!
//! Generation is pure: [`generate`] builds text and nothing else, and the
//! same inputs always produce byte-identical output. Writing the text to
//! [`target_path`] is the caller's job. The only randomness, the backend
//! secret, is produced separately by [`SecretKey::generate`] and passed in.

pub mod apache;
pub mod env;
pub mod nginx;
pub mod scripts;
pub mod secret;
pub mod unit;

use std::path::PathBuf;

use crate::config::{Configuration, SERVICE_NAME, WebServer};

pub use secret::SecretKey;

/// Permission bits for generated scripts
pub const SCRIPT_MODE: u32 = 0o755;

/// A generated file
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
    /// Reverse proxy site; `tls` selects the HTTPS variant when SSL is enabled
    ProxySite { tls: bool },
    BackendEnv { secret_key: &'a SecretKey },
    FrontendEnv,
    SupervisorUnit { datastore_unit: &'a str },
    RenewalScript,
    StatusScript { datastore_unit: &'a str },
    LogsScript,
    RestartScript,
}

impl Artifact<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Artifact::ProxySite { .. } => "proxy-site",
            Artifact::BackendEnv { .. } => "backend-env",
            Artifact::FrontendEnv => "frontend-env",
            Artifact::SupervisorUnit { .. } => "unit",
            Artifact::RenewalScript => "renewal-script",
            Artifact::StatusScript { .. } => "status-script",
            Artifact::LogsScript => "logs-script",
            Artifact::RestartScript => "restart-script",
        }
    }

    /// Whether the file must be executable
    pub fn is_script(&self) -> bool {
        matches!(
            self,
            Artifact::RenewalScript
                | Artifact::StatusScript { .. }
                | Artifact::LogsScript
                | Artifact::RestartScript
        )
    }
}

/// Render an artifact, or `None` when it does not apply to this configuration
///
/// Standalone deployments have no proxy site and no renewal script.
pub fn generate(artifact: &Artifact<'_>, config: &Configuration) -> Option<String> {
    let text = match *artifact {
        Artifact::ProxySite { tls } => {
            let tls = tls && config.enable_ssl();
            match config.web_server() {
                WebServer::Nginx => nginx::site(config, tls),
                WebServer::Apache => apache::site(config, tls),
                WebServer::Standalone => return None,
            }
        }
        Artifact::BackendEnv { secret_key } => env::backend(config, secret_key),
        Artifact::FrontendEnv => env::frontend(config),
        Artifact::SupervisorUnit { datastore_unit } => unit::service(config, datastore_unit),
        Artifact::RenewalScript => scripts::renewal(config.web_server().service()?),
        Artifact::StatusScript { datastore_unit } => scripts::status(config, datastore_unit),
        Artifact::LogsScript => scripts::logs(),
        Artifact::RestartScript => scripts::restart(config),
    };
    Some(text)
}

/// Where an artifact lives on the host
pub fn target_path(artifact: &Artifact<'_>, config: &Configuration) -> Option<PathBuf> {
    let path = match artifact {
        Artifact::ProxySite { .. } => match config.web_server() {
            WebServer::Nginx => PathBuf::from(format!("/etc/nginx/sites-available/{SERVICE_NAME}")),
            WebServer::Apache => {
                PathBuf::from(format!("/etc/apache2/sites-available/{SERVICE_NAME}.conf"))
            }
            WebServer::Standalone => return None,
        },
        Artifact::BackendEnv { .. } => config.backend_dir().join(".env"),
        Artifact::FrontendEnv => config.frontend_dir().join(".env"),
        Artifact::SupervisorUnit { .. } => unit_path(),
        Artifact::RenewalScript => {
            config.web_server().service()?;
            PathBuf::from("/etc/cron.daily/certbot-renewal")
        }
        Artifact::StatusScript { .. } => config.install_dir().join("status.sh"),
        Artifact::LogsScript => config.install_dir().join("logs.sh"),
        Artifact::RestartScript => config.install_dir().join("restart.sh"),
    };
    Some(path)
}

/// Location of the application's systemd unit
pub fn unit_path() -> PathBuf {
    PathBuf::from(format!("/etc/systemd/system/{SERVICE_NAME}.service"))
}

/// Symlink that activates the nginx site
pub fn nginx_enabled_path() -> PathBuf {
    PathBuf::from(format!("/etc/nginx/sites-enabled/{SERVICE_NAME}"))
}
