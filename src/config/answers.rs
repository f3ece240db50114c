//! Non-interactive answers: the YAML answers file and command-line overrides
//!
//! ```yaml
//! domain: poll.example.com
//! enable_ssl: true
//! ssl_email: admin@example.com
//! web_server: nginx
//! environment: production
//! install_dir: /opt/secret-poll
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Configuration, ConfigurationBuilder, Environment, WebServer};
use crate::error::{Result, StagehandError};

/// Partially specified configuration
///
/// Every field is optional; missing values fall back to defaults (or to a
/// prompt when collecting interactively).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Answers {
    pub domain: Option<String>,
    pub enable_ssl: Option<bool>,
    pub ssl_email: Option<String>,
    pub web_server: Option<WebServer>,
    pub environment: Option<Environment>,
    pub install_dir: Option<PathBuf>,
}

impl Answers {
    /// Load answers from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StagehandError::ConfigReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Self::from_yaml(&content).map_err(|e| match e {
            StagehandError::ConfigParseFailed { reason, .. } => {
                StagehandError::ConfigParseFailed {
                    path: path.display().to_string(),
                    reason,
                }
            }
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win
    #[must_use]
    pub fn merge(self, overrides: Answers) -> Answers {
        Answers {
            domain: overrides.domain.or(self.domain),
            enable_ssl: overrides.enable_ssl.or(self.enable_ssl),
            ssl_email: overrides.ssl_email.or(self.ssl_email),
            web_server: overrides.web_server.or(self.web_server),
            environment: overrides.environment.or(self.environment),
            install_dir: overrides.install_dir.or(self.install_dir),
        }
    }

    /// Whether TLS is wanted: explicit choice first, otherwise "an email was given"
    pub fn wants_ssl(&self) -> bool {
        self.enable_ssl
            .unwrap_or_else(|| self.ssl_email.as_deref().is_some_and(|e| !e.is_empty()))
    }

    /// Builder for these answers, or `None` when no domain is known yet
    pub fn to_builder(&self) -> Option<ConfigurationBuilder> {
        let domain = self.domain.as_deref()?;
        let mut builder = Configuration::builder(domain)
            .ssl_requested(self.wants_ssl())
            .ssl_email(self.ssl_email.clone())
            .web_server(self.web_server.unwrap_or_default())
            .environment(self.environment.unwrap_or_default());
        if let Some(dir) = &self.install_dir {
            builder = builder.install_dir(dir.clone());
        }
        Some(builder)
    }
}
