//! Host capabilities used by the installation steps
//!
//! Each external tool family sits behind a small trait so another backend
//! (a different package manager or init system) can be swapped in without
//! touching the steps. Every method receives the [`Executor`], so all
//! invocations are logged and classified in one place.

pub mod apt;
pub mod certbot;
pub mod host;
pub mod layout;
pub mod systemd;
pub mod ufw;

use std::path::Path;

use crate::config::WebServer;
use crate::error::Result;
use crate::exec::{CommandResult, Executor};

pub use host::{HostProbe, OsFamily, SystemHost};
pub use layout::Layout;

/// Installs distribution packages
pub trait PackageInstaller {
    /// Refresh the package index
    fn refresh(&self, exec: &mut Executor) -> Result<()>;

    fn install(&self, exec: &mut Executor, packages: &[&str], description: &str) -> Result<()>;

    /// Drop caches and orphaned packages; failures are tolerated
    fn tidy(&self, exec: &mut Executor);
}

/// Lifecycle operations on a supervised service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Reload,
    Enable,
    Disable,
}

impl ServiceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
            ServiceAction::Reload => "reload",
            ServiceAction::Enable => "enable",
            ServiceAction::Disable => "disable",
        }
    }
}

/// Controls and queries the service manager
pub trait ServiceManager {
    /// Apply `action` to `unit`; with `tolerate_failure` a failure is only a warning
    fn control(
        &self,
        exec: &mut Executor,
        action: ServiceAction,
        unit: &str,
        tolerate_failure: bool,
    ) -> Result<CommandResult>;

    fn is_active(&self, exec: &mut Executor, unit: &str) -> bool;

    /// Whether a unit file named `<unit>.service` is installed
    fn has_unit(&self, exec: &mut Executor, unit: &str) -> bool;

    /// Re-read unit files after writing one
    fn reload_units(&self, exec: &mut Executor) -> Result<()>;

    fn enable_and_start(&self, exec: &mut Executor, unit: &str) -> Result<()> {
        self.control(exec, ServiceAction::Enable, unit, false)?;
        self.control(exec, ServiceAction::Start, unit, false)?;
        Ok(())
    }

    fn reload(&self, exec: &mut Executor, unit: &str) -> Result<()> {
        self.control(exec, ServiceAction::Reload, unit, false)?;
        Ok(())
    }
}

/// Obtains TLS certificates
pub trait CertificateIssuer {
    /// Install the issuer client (and the plugin for the chosen proxy)
    fn install(
        &self,
        exec: &mut Executor,
        packages: &dyn PackageInstaller,
        web_server: WebServer,
    ) -> Result<()>;

    /// Request a certificate using the webroot challenge
    fn obtain(&self, exec: &mut Executor, webroot: &Path, domain: &str, email: &str)
    -> Result<()>;

    /// Validity period of an issued certificate, one line per field
    fn certificate_dates(&self, exec: &mut Executor, certificate: &Path) -> Option<Vec<String>>;
}

/// Host packet filter
pub trait Firewall {
    fn install(&self, exec: &mut Executor, packages: &dyn PackageInstaller) -> Result<()>;

    /// Start from a clean rule set that denies inbound and allows outbound traffic
    fn reset_to_defaults(&self, exec: &mut Executor) -> Result<()>;

    /// Allow a service name or `port/proto` rule
    fn allow(&self, exec: &mut Executor, rule: &str) -> Result<()>;

    fn enable(&self, exec: &mut Executor) -> Result<()>;

    /// `Some(true)` when active, `None` when the state cannot be determined
    fn is_active(&self, exec: &mut Executor) -> Option<bool>;
}

/// The set of capability backends a run uses
pub struct Toolbox {
    pub packages: Box<dyn PackageInstaller>,
    pub services: Box<dyn ServiceManager>,
    pub certificates: Box<dyn CertificateIssuer>,
    pub firewall: Box<dyn Firewall>,
}

impl Toolbox {
    /// Debian/Ubuntu backends: apt, systemd, certbot, ufw
    pub fn system() -> Self {
        Self {
            packages: Box::new(apt::Apt),
            services: Box::new(systemd::Systemd),
            certificates: Box::new(certbot::Certbot),
            firewall: Box::new(ufw::Ufw),
        }
    }
}
