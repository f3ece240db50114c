//! Configuration sources
//!
//! A run gets its configuration either from interactive prompts or from a
//! preset (answers file plus flags). Both produce the same validated
//! [`Configuration`].

use std::path::PathBuf;

use inquire::validator::{ErrorMessage, Validation};
use inquire::{Confirm, CustomUserError, Select, Text};

use super::{
    Answers, Configuration, ConfigurationBuilder, DEFAULT_INSTALL_DIR, Environment, WebServer,
    validate,
};
use crate::context::Logger;
use crate::error::{Result, StagehandError};

/// Where the run's configuration comes from
pub trait ConfigSource {
    /// Produce a validated configuration
    fn collect(&mut self, log: &mut dyn Logger) -> Result<Configuration>;

    /// Final go/no-go after the summary has been shown
    fn confirm(&mut self, config: &Configuration) -> Result<bool>;
}

/// Configuration fully determined by an answers file and/or flags
pub struct PresetSource {
    answers: Answers,
    assume_yes: bool,
}

impl PresetSource {
    pub fn new(answers: Answers, assume_yes: bool) -> Self {
        Self {
            answers,
            assume_yes,
        }
    }
}

impl ConfigSource for PresetSource {
    fn collect(&mut self, log: &mut dyn Logger) -> Result<Configuration> {
        let builder = self
            .answers
            .to_builder()
            .ok_or_else(|| StagehandError::ConfigInvalid {
                message: "no domain was provided".to_string(),
            })?;
        finish(builder, log)
    }

    fn confirm(&mut self, _config: &Configuration) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        confirm_prompt()
    }
}

/// Prompts the operator for every choice, using known answers as defaults
pub struct InteractiveSource {
    defaults: Answers,
    assume_yes: bool,
}

impl InteractiveSource {
    pub fn new(defaults: Answers, assume_yes: bool) -> Self {
        Self {
            defaults,
            assume_yes,
        }
    }
}

impl ConfigSource for InteractiveSource {
    fn collect(&mut self, log: &mut dyn Logger) -> Result<Configuration> {
        log.step("Starting configuration setup");

        let mut domain_prompt = Text::new("Domain or IP address:")
            .with_placeholder("poll.yourdomain.com")
            .with_validator(domain_validator);
        if let Some(domain) = self.defaults.domain.as_deref() {
            domain_prompt = domain_prompt.with_default(domain);
        }
        let domain = domain_prompt.prompt()?.trim().to_string();

        let mut builder = Configuration::builder(domain.as_str());

        if !validate::is_ip_address(&domain) {
            let enable_ssl = Confirm::new("Enable SSL with Let's Encrypt?")
                .with_default(self.defaults.enable_ssl.unwrap_or(true))
                .prompt()?;

            if enable_ssl {
                let mut email_prompt =
                    Text::new("Email for SSL certificates:").with_validator(email_validator);
                if let Some(email) = self.defaults.ssl_email.as_deref() {
                    email_prompt = email_prompt.with_default(email);
                }
                builder = builder.ssl(email_prompt.prompt()?);
            }
        }

        let servers = [WebServer::Nginx, WebServer::Apache, WebServer::Standalone];
        let labels = vec![
            "Nginx (recommended)",
            "Apache",
            "Standalone (no reverse proxy)",
        ];
        let start = servers
            .iter()
            .position(|s| Some(*s) == self.defaults.web_server)
            .unwrap_or(0);
        let choice = Select::new("Web server:", labels)
            .with_starting_cursor(start)
            .without_filtering()
            .raw_prompt()?;
        builder = builder.web_server(servers[choice.index]);

        let environments = [Environment::Production, Environment::Staging];
        let start = environments
            .iter()
            .position(|e| Some(*e) == self.defaults.environment)
            .unwrap_or(0);
        let choice = Select::new("Environment:", vec!["production", "staging"])
            .with_starting_cursor(start)
            .without_filtering()
            .raw_prompt()?;
        builder = builder.environment(environments[choice.index]);

        let default_dir = self
            .defaults
            .install_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_DIR));
        let install_dir = Text::new("Installation directory:")
            .with_default(&default_dir.display().to_string())
            .with_validator(install_dir_validator)
            .prompt()?;
        builder = builder.install_dir(install_dir.trim());

        finish(builder, log)
    }

    fn confirm(&mut self, _config: &Configuration) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        confirm_prompt()
    }
}

fn finish(builder: ConfigurationBuilder, log: &mut dyn Logger) -> Result<Configuration> {
    if let Some(reason) = builder.ssl_drop_reason() {
        log.warn(&format!(
            "SSL was requested but is not available for {reason}; using HTTP only"
        ));
    }
    builder.build()
}

fn confirm_prompt() -> Result<bool> {
    Ok(Confirm::new("Proceed with installation?")
        .with_default(true)
        .with_help_message("Press Enter to confirm, or 'n' to cancel")
        .prompt()?)
}

fn domain_validator(input: &str) -> std::result::Result<Validation, CustomUserError> {
    Ok(as_validation(validate::validate_domain(input.trim()).map(|_| ())))
}

fn email_validator(input: &str) -> std::result::Result<Validation, CustomUserError> {
    Ok(as_validation(validate::validate_email(input.trim())))
}

fn install_dir_validator(input: &str) -> std::result::Result<Validation, CustomUserError> {
    Ok(as_validation(validate::validate_install_dir(
        std::path::Path::new(input.trim()),
    )))
}

fn as_validation(result: Result<()>) -> Validation {
    match result {
        Ok(()) => Validation::Valid,
        Err(e) => Validation::Invalid(ErrorMessage::Custom(e.to_string())),
    }
}
