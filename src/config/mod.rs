//! Installation configuration
//!
//! This module contains:
//! - `Configuration` - the validated, immutable set of operator choices
//! - `validate` - domain, email and path validation
//! - `answers` - the YAML answers file and flag overrides
//! - `collector` - where a configuration comes from (prompts or presets)

pub mod answers;
pub mod collector;
pub mod validate;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StagehandError};

pub use answers::Answers;
pub use collector::{ConfigSource, InteractiveSource, PresetSource};

/// Port the application listens on
pub const APP_PORT: u16 = 8001;

/// Port the datastore listens on
pub const DATASTORE_PORT: u16 = 27017;

/// Connection string written into the backend environment
pub const DATASTORE_URL: &str = "mongodb://localhost:27017/secret_poll";

/// Supervisor unit name of the application
pub const SERVICE_NAME: &str = "secret-poll";

/// Unprivileged account the application runs as
pub const SERVICE_ACCOUNT: &str = "www-data";

/// Root of the certificate issuer's state
pub const CERT_ROOT: &str = "/etc/letsencrypt";

pub const DEFAULT_INSTALL_DIR: &str = "/opt/secret-poll";

/// Application health endpoint path
pub const HEALTH_PATH: &str = "/api/health";

/// Reverse proxy engine in front of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WebServer {
    #[default]
    Nginx,
    Apache,
    /// No reverse proxy, clients talk to the application port directly
    Standalone,
}

impl WebServer {
    pub fn as_str(self) -> &'static str {
        match self {
            WebServer::Nginx => "nginx",
            WebServer::Apache => "apache",
            WebServer::Standalone => "standalone",
        }
    }

    /// Service (and package) name of the proxy, if there is one
    pub fn service(self) -> Option<&'static str> {
        match self {
            WebServer::Nginx => Some("nginx"),
            WebServer::Apache => Some("apache2"),
            WebServer::Standalone => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WebServer::Nginx => "Nginx",
            WebServer::Apache => "Apache",
            WebServer::Standalone => "Standalone",
        }
    }
}

impl fmt::Display for WebServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment name passed to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated operator choices for one installation run
///
/// Built only through [`ConfigurationBuilder`]. Once built, `ssl_email` is
/// present exactly when `enable_ssl` is set, and `enable_ssl` is never set
/// for an IP address or a standalone deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    domain: String,
    is_ip: bool,
    enable_ssl: bool,
    ssl_email: Option<String>,
    web_server: WebServer,
    environment: Environment,
    install_dir: PathBuf,
}

impl Configuration {
    pub fn builder(domain: impl Into<String>) -> ConfigurationBuilder {
        ConfigurationBuilder::new(domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_ip(&self) -> bool {
        self.is_ip
    }

    pub fn enable_ssl(&self) -> bool {
        self.enable_ssl
    }

    pub fn ssl_email(&self) -> Option<&str> {
        self.ssl_email.as_deref()
    }

    pub fn web_server(&self) -> WebServer {
        self.web_server
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn backend_dir(&self) -> PathBuf {
        self.install_dir.join("backend")
    }

    pub fn frontend_dir(&self) -> PathBuf {
        self.install_dir.join("frontend")
    }

    /// Directory the proxy serves static files (and ACME challenges) from
    pub fn build_dir(&self) -> PathBuf {
        self.frontend_dir().join("build")
    }

    pub fn cert_dir(&self) -> PathBuf {
        Path::new(CERT_ROOT).join("live").join(&self.domain)
    }

    /// Public URL of the application for the given TLS state
    pub fn public_url(&self, tls: bool) -> String {
        match (self.web_server, tls) {
            (WebServer::Standalone, _) => format!("http://{}:{APP_PORT}", self.domain),
            (_, true) => format!("https://{}", self.domain),
            (_, false) => format!("http://{}", self.domain),
        }
    }
}

/// Collects raw choices and validates them into a [`Configuration`]
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    domain: String,
    ssl_requested: bool,
    ssl_email: Option<String>,
    web_server: WebServer,
    environment: Environment,
    install_dir: PathBuf,
}

impl ConfigurationBuilder {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into().trim().to_string(),
            ssl_requested: false,
            ssl_email: None,
            web_server: WebServer::default(),
            environment: Environment::default(),
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
        }
    }

    /// Request TLS with the given registration email
    pub fn ssl(mut self, email: impl Into<String>) -> Self {
        self.ssl_requested = true;
        self.ssl_email = Some(email.into().trim().to_string());
        self
    }

    pub fn ssl_requested(mut self, requested: bool) -> Self {
        self.ssl_requested = requested;
        self
    }

    pub fn ssl_email(mut self, email: Option<String>) -> Self {
        self.ssl_email = email.map(|e| e.trim().to_string());
        self
    }

    pub fn web_server(mut self, web_server: WebServer) -> Self {
        self.web_server = web_server;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn install_dir(mut self, install_dir: impl Into<PathBuf>) -> Self {
        self.install_dir = install_dir.into();
        self
    }

    /// Why TLS was asked for but cannot apply to this domain/proxy
    pub fn ssl_drop_reason(&self) -> Option<&'static str> {
        if !self.ssl_requested {
            return None;
        }
        if validate::is_ip_address(&self.domain) {
            Some("an IP address")
        } else if self.web_server == WebServer::Standalone {
            Some("a standalone deployment without a reverse proxy")
        } else {
            None
        }
    }

    fn tls_eligible(&self) -> bool {
        !validate::is_ip_address(&self.domain) && self.web_server != WebServer::Standalone
    }

    pub fn build(self) -> Result<Configuration> {
        let is_ip = validate::validate_domain(&self.domain)?;
        validate::validate_install_dir(&self.install_dir)?;

        let enable_ssl = self.ssl_requested && self.tls_eligible();
        let ssl_email = if enable_ssl {
            let email = self
                .ssl_email
                .filter(|e| !e.is_empty())
                .ok_or_else(|| StagehandError::ConfigInvalid {
                    message: "an email address is required when SSL is enabled".to_string(),
                })?;
            validate::validate_email(&email)?;
            Some(email)
        } else {
            None
        };

        Ok(Configuration {
            domain: self.domain,
            is_ip,
            enable_ssl,
            ssl_email,
            web_server: self.web_server,
            environment: self.environment,
            install_dir: self.install_dir,
        })
    }
}
