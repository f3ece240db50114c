//! The installation steps and the environment they share
//!
//! Each step is a plain function over a [`StepEnv`]. The environment bundles
//! the executor, the capability backends, host facts and the configuration
//! once it has been collected, plus the facts established while running
//! (whether TLS is actually live, which strategy provided each dependency).

pub mod application;
pub mod cleanup;
pub mod collect;
pub mod dependencies;
pub mod finalize;
pub mod firewall;
pub mod preflight;
pub mod proxy;
pub mod supervisor;
pub mod tls;
pub mod tooling;
pub mod verification;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::config::{ConfigSource, Configuration};
use crate::context::{Level, Logger};
use crate::error::{Result, StagehandError};
use crate::exec::Executor;
use crate::generate::{self, Artifact};
use crate::sequencer::Step;
use crate::system::{HostProbe, Layout, Toolbox};
use crate::verify::{NetworkProbe, ProbeOptions, VerificationReport};

/// Datastore unit assumed when none was detected
pub const DEFAULT_DATASTORE_UNIT: &str = "mongod";

/// Waits and probe timeouts used during a run
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Pause after starting a service before checking it
    pub service_settle: Duration,
    /// Pause before the verification pass
    pub verification_delay: Duration,
    pub probes: ProbeOptions,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            service_settle: Duration::from_secs(3),
            verification_delay: Duration::from_secs(5),
            probes: ProbeOptions::default(),
        }
    }
}

impl Timings {
    /// No waiting at all
    #[cfg(test)]
    pub fn instant() -> Self {
        Self {
            service_settle: Duration::ZERO,
            verification_delay: Duration::ZERO,
            probes: ProbeOptions {
                timeout: Duration::from_millis(100),
                recheck_delay: Duration::ZERO,
            },
        }
    }
}

/// Facts established while the run progresses
#[derive(Debug, Clone, Default)]
pub struct RunFacts {
    /// A certificate was obtained and the proxy serves HTTPS
    pub tls_active: bool,
    /// Datastore service unit, once detected
    pub datastore_unit: Option<String>,
    /// Strategy that provided each capability (`"exhausted"` when none did)
    pub capabilities: BTreeMap<String, String>,
    pub verification: Option<VerificationReport>,
}

impl RunFacts {
    pub fn datastore_unit(&self) -> &str {
        self.datastore_unit
            .as_deref()
            .unwrap_or(DEFAULT_DATASTORE_UNIT)
    }
}

/// Everything a step can touch
pub struct StepEnv {
    pub exec: Executor,
    pub tools: Toolbox,
    pub host: Box<dyn HostProbe>,
    pub network: Box<dyn NetworkProbe>,
    pub layout: Layout,
    pub timings: Timings,
    pub facts: RunFacts,
    /// Directory holding the `backend/` and `frontend/` sources
    pub source_dir: PathBuf,
    config_source: Box<dyn ConfigSource>,
    config: Option<Configuration>,
    /// Install directory known before configuration is collected
    install_dir_hint: PathBuf,
}

impl StepEnv {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exec: Executor,
        tools: Toolbox,
        host: Box<dyn HostProbe>,
        network: Box<dyn NetworkProbe>,
        layout: Layout,
        timings: Timings,
        config_source: Box<dyn ConfigSource>,
        install_dir_hint: PathBuf,
        source_dir: PathBuf,
    ) -> Self {
        Self {
            exec,
            tools,
            host,
            network,
            layout,
            timings,
            facts: RunFacts::default(),
            source_dir,
            config_source,
            config: None,
            install_dir_hint,
        }
    }

    /// The collected configuration
    pub fn config(&self) -> Result<&Configuration> {
        self.config
            .as_ref()
            .ok_or(StagehandError::ConfigurationMissing)
    }

    /// The configuration, if collection already happened
    pub fn collected(&self) -> Option<&Configuration> {
        self.config.as_ref()
    }

    pub fn install_dir_hint(&self) -> &std::path::Path {
        &self.install_dir_hint
    }

    /// Sleep unless the timings say not to
    pub fn settle(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }

    /// Render an artifact and write it to its target path
    ///
    /// Returns the host path written, or `None` when the artifact does not
    /// apply to this configuration.
    pub fn write_artifact(&mut self, artifact: &Artifact<'_>) -> Result<Option<PathBuf>> {
        let config = self.config()?;
        let (Some(contents), Some(path)) = (
            generate::generate(artifact, config),
            generate::target_path(artifact, config),
        ) else {
            return Ok(None);
        };
        let mode = artifact.is_script().then_some(generate::SCRIPT_MODE);

        self.layout.write(&path, &contents, mode)?;
        self.exec.ctx_mut().record(
            Level::Info,
            &format!("Wrote {} to {}", artifact.name(), path.display()),
        );
        Ok(Some(path))
    }

    /// Remember which strategy provided a capability
    pub fn record_capability(&mut self, capability: &str, provider: &str) {
        self.facts
            .capabilities
            .insert(capability.to_string(), provider.to_string());
    }
}

impl Logger for StepEnv {
    fn log(&mut self, level: Level, message: &str) {
        self.exec.log(level, message);
    }
}

/// The installation plan, in execution order
pub fn plan() -> Vec<Step> {
    vec![
        Step::fatal("Checking system requirements and permissions", preflight::run),
        Step::fatal("Cleaning environment to prevent conflicts", cleanup::run),
        Step::fatal("Collecting installation configuration", collect::run),
        Step::fatal("Installing system dependencies", dependencies::run),
        Step::fatal("Setting up application files", application::run),
        Step::fatal("Configuring web server", proxy::run),
        Step::fatal("Setting up SSL certificates", tls::run),
        Step::fatal("Creating system service", supervisor::run),
        Step::advisory("Configuring firewall", firewall::run),
        Step::fatal("Creating management tools", tooling::run),
        Step::advisory("Verifying installation", verification::run),
        Step::fatal("Starting services and finalizing", finalize::run),
    ]
}
