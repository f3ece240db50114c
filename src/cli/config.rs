use std::path::PathBuf;

use clap::Args;

use crate::config::{Answers, Environment, WebServer};
use crate::error::Result;

/// Configuration flags shared by commands that describe a deployment
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Domain name or IP address the application is served on
    #[arg(long, short = 'd', env = "STAGEHAND_DOMAIN")]
    pub domain: Option<String>,

    /// Email for certificate registration (enables SSL)
    #[arg(long, short = 'e', env = "STAGEHAND_EMAIL")]
    pub email: Option<String>,

    /// Serve plain HTTP even if an email is given
    #[arg(long, conflicts_with = "email")]
    pub no_ssl: bool,

    /// Reverse proxy in front of the application
    #[arg(long, value_enum)]
    pub web_server: Option<WebServer>,

    /// Deployment environment
    #[arg(long, value_enum)]
    pub environment: Option<Environment>,

    /// Installation directory
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// YAML answers file; flags override its values
    #[arg(long, short = 'a', value_name = "FILE", env = "STAGEHAND_ANSWERS")]
    pub answers: Option<PathBuf>,
}

impl ConfigArgs {
    /// Answers from the answers file with the flags layered on top
    pub fn answers(&self) -> Result<Answers> {
        let base = match &self.answers {
            Some(path) => Answers::from_file(path)?,
            None => Answers::default(),
        };
        Ok(base.merge(self.overrides()))
    }

    fn overrides(&self) -> Answers {
        let enable_ssl = if self.no_ssl {
            Some(false)
        } else if self.email.is_some() {
            Some(true)
        } else {
            None
        };
        Answers {
            domain: self.domain.clone(),
            enable_ssl,
            ssl_email: self.email.clone(),
            web_server: self.web_server,
            environment: self.environment,
            install_dir: self.install_dir.clone(),
        }
    }
}
