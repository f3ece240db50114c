//! Host readiness assessment
//!
//! Looks at a machine before anything is installed and grades how likely an
//! installation is to succeed. Nothing is changed on the host.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::common::version::Version;
use crate::config::{APP_PORT, DATASTORE_PORT};
use crate::context::Logger;
use crate::exec::Executor;
use crate::system::host::{as_gib, gib};
use crate::system::{Firewall, HostProbe, OsFamily};
use crate::verify::NetworkProbe;

/// Registries the installer downloads from
pub const REQUIRED_ENDPOINTS: [&str; 4] = [
    "https://deb.nodesource.com",
    "https://www.mongodb.org",
    "https://registry.npmjs.org",
    "https://pypi.org",
];

/// Ports the deployment listens on
pub const REQUIRED_PORTS: [u16; 4] = [80, 443, APP_PORT, DATASTORE_PORT];

/// Files a usable source tree must contain
pub const REQUIRED_SOURCES: [&str; 3] = [
    "backend/server.py",
    "backend/requirements.txt",
    "frontend/package.json",
];

/// Python packages the backend cannot run without
pub const CRITICAL_REQUIREMENTS: [&str; 5] =
    ["fastapi", "uvicorn", "pymongo", "websockets", "reportlab"];

const NODE_OPTIMAL_MAJOR: u32 = 20;
const NODE_MINIMUM: Version = Version::new(18, 17, 0);
const NPM_MINIMUM_MAJOR: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Issue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub area: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Overall verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Perfect,
    Good,
    Acceptable,
    NeedsAttention,
    NotReady,
}

impl Grade {
    pub fn from_counts(issues: usize, warnings: usize) -> Self {
        match (issues, warnings) {
            (0, 0) => Grade::Perfect,
            (0, w) if w <= 3 => Grade::Good,
            (0, _) => Grade::Acceptable,
            (i, _) if i <= 2 => Grade::NeedsAttention,
            _ => Grade::NotReady,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Perfect => "PERFECT",
            Grade::Good => "GOOD",
            Grade::Acceptable => "ACCEPTABLE",
            Grade::NeedsAttention => "NEEDS ATTENTION",
            Grade::NotReady => "NOT READY",
        }
    }

    pub fn verdict(self) -> &'static str {
        match self {
            Grade::Perfect => "Ready for production",
            Grade::Good => "Ready for production with minor warnings",
            Grade::Acceptable => "Can be installed; review the warnings first",
            Grade::NeedsAttention => "Resolve the issues before installing",
            Grade::NotReady => "Not ready for installation",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub findings: Vec<Finding>,
}

impl ReadinessReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn issues(&self) -> usize {
        self.count(Severity::Issue)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn grade(&self) -> Grade {
        Grade::from_counts(self.issues(), self.warnings())
    }
}

/// Gathers findings about one host
pub struct Assessor<'a> {
    pub exec: &'a mut Executor,
    pub host: &'a dyn HostProbe,
    pub network: &'a dyn NetworkProbe,
    pub firewall: &'a dyn Firewall,
    pub source_dir: PathBuf,
    /// Skip the registry reachability checks
    pub offline: bool,
    pub timeout: Duration,
}

impl Assessor<'_> {
    pub fn assess(&mut self) -> ReadinessReport {
        let mut report = ReadinessReport::default();

        self.exec.step("Checking system");
        self.check_os(&mut report);
        self.check_memory(&mut report);
        self.check_disk(&mut report);
        self.check_systemd(&mut report);

        self.exec.step("Checking toolchain");
        self.check_node(&mut report);
        self.check_npm(&mut report);
        self.check_yarn(&mut report);

        self.exec.step("Checking network");
        if self.offline {
            self.exec.info("Skipping registry reachability (offline)");
        } else {
            self.check_endpoints(&mut report);
        }
        self.check_ports(&mut report);

        self.exec.step("Checking security");
        self.check_privilege(&mut report);
        self.check_firewall(&mut report);
        self.check_openssl(&mut report);

        self.exec.step("Checking application sources");
        self.check_sources(&mut report);

        report
    }

    fn check_os(&mut self, report: &mut ReadinessReport) {
        match self.host.os_release().map(|t| OsFamily::from_os_release(&t)) {
            Some(OsFamily::Ubuntu | OsFamily::Debian) => {
                self.add(report, "system", Severity::Success, "Supported OS: Debian/Ubuntu".to_string());
            }
            Some(OsFamily::RedHat) => self.add(
                report,
                "system",
                Severity::Warning,
                "RedHat-family OS detected; the installer targets Debian/Ubuntu".to_string(),
            ),
            Some(OsFamily::Other) => self.add(
                report,
                "system",
                Severity::Warning,
                "Unrecognised OS; the installer targets Debian/Ubuntu".to_string(),
            ),
            None => self.add(
                report,
                "system",
                Severity::Warning,
                "Could not read /etc/os-release".to_string(),
            ),
        }
    }

    fn check_memory(&mut self, report: &mut ReadinessReport) {
        let Some(total) = self.host.total_memory_bytes() else {
            self.add(report, "system", Severity::Warning, "Could not determine memory size".to_string());
            return;
        };
        let message = format!("Memory: {:.1}GB", as_gib(total));
        let severity = if total >= gib(2) {
            Severity::Success
        } else if total >= gib(1) {
            Severity::Warning
        } else {
            Severity::Issue
        };
        self.add(report, "system", severity, message);
    }

    fn check_disk(&mut self, report: &mut ReadinessReport) {
        match self.host.available_disk_bytes(Path::new("/")) {
            Ok(free) => {
                let message = format!("Free disk space: {:.1}GB", as_gib(free));
                let severity = if free >= gib(10) {
                    Severity::Success
                } else if free >= gib(5) {
                    Severity::Warning
                } else {
                    Severity::Issue
                };
                self.add(report, "system", severity, message);
            }
            Err(e) => self.add(report, "system", Severity::Warning, e.to_string()),
        }
    }

    fn check_systemd(&mut self, report: &mut ReadinessReport) {
        if self.exec.probe(&["systemctl", "--version"]).succeeded {
            self.add(report, "system", Severity::Success, "systemd available".to_string());
        } else {
            self.add(report, "system", Severity::Issue, "systemd not available".to_string());
        }
    }

    fn check_node(&mut self, report: &mut ReadinessReport) {
        let Some(version) = self.tool_version(&["node", "--version"]) else {
            self.add(report, "toolchain", Severity::Issue, "Node.js not installed".to_string());
            return;
        };
        let (severity, message) = if version.major >= NODE_OPTIMAL_MAJOR {
            (Severity::Success, format!("Node.js {version} (optimal)"))
        } else if version >= NODE_MINIMUM {
            (Severity::Success, format!("Node.js {version} (compatible)"))
        } else if version.major >= 18 {
            (
                Severity::Warning,
                format!("Node.js {version} may have compatibility issues; 18.17+ recommended"),
            )
        } else {
            (
                Severity::Issue,
                format!("Node.js {version} too old; 18.17+ required"),
            )
        };
        self.add(report, "toolchain", severity, message);
    }

    fn check_npm(&mut self, report: &mut ReadinessReport) {
        match self.tool_version(&["npm", "--version"]) {
            Some(v) if v.major >= NPM_MINIMUM_MAJOR => {
                self.add(report, "toolchain", Severity::Success, format!("npm {v}"));
            }
            Some(v) => self.add(
                report,
                "toolchain",
                Severity::Warning,
                format!("npm {v} is old; 8+ recommended"),
            ),
            None => self.add(report, "toolchain", Severity::Issue, "npm not installed".to_string()),
        }
    }

    fn check_yarn(&mut self, report: &mut ReadinessReport) {
        match self.tool_version(&["yarn", "--version"]) {
            Some(v) => self.add(report, "toolchain", Severity::Success, format!("Yarn {v}")),
            None => self.add(
                report,
                "toolchain",
                Severity::Warning,
                "Yarn not installed (optional, installed on demand)".to_string(),
            ),
        }
    }

    fn check_endpoints(&mut self, report: &mut ReadinessReport) {
        for url in REQUIRED_ENDPOINTS {
            // Any HTTP answer proves reachability
            match self.network.http_status(url, self.timeout) {
                Ok(_) => self.add(report, "network", Severity::Success, format!("Can reach {url}")),
                Err(reason) => self.add(
                    report,
                    "network",
                    Severity::Warning,
                    format!("Cannot reach {url}: {reason}"),
                ),
            }
        }
    }

    fn check_ports(&mut self, report: &mut ReadinessReport) {
        for port in REQUIRED_PORTS {
            if self.network.tcp_reachable("127.0.0.1", port, self.timeout) {
                self.add(
                    report,
                    "network",
                    Severity::Warning,
                    format!("Port {port} is already in use"),
                );
            } else {
                self.add(report, "network", Severity::Success, format!("Port {port} is available"));
            }
        }
    }

    fn check_privilege(&mut self, report: &mut ReadinessReport) {
        if self.host.is_privileged() {
            self.add(report, "security", Severity::Success, "Running as root".to_string());
        } else {
            self.add(
                report,
                "security",
                Severity::Warning,
                "Not running as root; installation requires root".to_string(),
            );
        }
    }

    fn check_firewall(&mut self, report: &mut ReadinessReport) {
        match self.firewall.is_active(self.exec) {
            Some(true) => self.add(report, "security", Severity::Success, "Firewall active".to_string()),
            Some(false) => self.add(
                report,
                "security",
                Severity::Warning,
                "Firewall inactive (the installer enables it)".to_string(),
            ),
            None => self.add(
                report,
                "security",
                Severity::Warning,
                "Firewall status unknown (ufw not installed)".to_string(),
            ),
        }
    }

    fn check_openssl(&mut self, report: &mut ReadinessReport) {
        match self.tool_version(&["openssl", "version"]) {
            Some(v) => self.add(report, "security", Severity::Success, format!("OpenSSL {v}")),
            None => self.add(report, "security", Severity::Issue, "OpenSSL not available".to_string()),
        }
    }

    fn check_sources(&mut self, report: &mut ReadinessReport) {
        for relative in REQUIRED_SOURCES {
            let path = self.source_dir.join(relative);
            if path.is_file() {
                self.add(report, "application", Severity::Success, format!("{relative} present"));
            } else {
                self.add(report, "application", Severity::Issue, format!("{relative} missing"));
            }
        }

        let Ok(requirements) = std::fs::read_to_string(self.source_dir.join("backend/requirements.txt")) else {
            return;
        };
        let requirements = requirements.to_lowercase();
        for package in CRITICAL_REQUIREMENTS {
            if !requirements.contains(package) {
                self.add(
                    report,
                    "application",
                    Severity::Issue,
                    format!("requirements.txt does not list {package}"),
                );
            }
        }
    }

    fn tool_version(&mut self, argv: &[&str]) -> Option<Version> {
        let result = self.exec.probe(argv);
        if !result.succeeded {
            return None;
        }
        Version::parse(result.stdout_trimmed())
    }

    fn add(&mut self, report: &mut ReadinessReport, area: &'static str, severity: Severity, message: String) {
        match severity {
            Severity::Success => self.exec.success(&message),
            Severity::Warning => self.exec.warn(&message),
            Severity::Issue => self.exec.error(&message),
        }
        report.findings.push(Finding {
            area,
            severity,
            message,
        });
    }
}
