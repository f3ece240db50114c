//! Post-install verification
//!
//! Checks that the installed files exist, that the services came up and that
//! the HTTP endpoints answer. Failures are reported, never raised: the report
//! is advisory and the caller decides what to do with it.

pub mod probe;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::config::{
    APP_PORT, Configuration, DATASTORE_PORT, HEALTH_PATH, SERVICE_NAME, WebServer,
};
use crate::context::Logger;
use crate::exec::Executor;
use crate::generate;
use crate::system::{Layout, ServiceManager};

pub use probe::{LiveNetwork, NetworkProbe};

/// Python modules the backend cannot start without
const BACKEND_IMPORTS: &str = "import fastapi, pymongo, reportlab";

/// One verified property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationItem {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Outcome of a verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub items: Vec<VerificationItem>,
}

impl VerificationReport {
    pub fn passed(&self) -> usize {
        self.items.iter().filter(|item| item.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &VerificationItem> {
        self.items.iter().filter(|item| !item.passed)
    }
}

/// What a pass checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTargets {
    pub files: Vec<PathBuf>,
    pub services: Vec<String>,
    /// Virtual environment whose interpreter must import the backend modules
    pub backend_python: Option<PathBuf>,
    pub datastore_port: u16,
    pub health_url: String,
    /// `None` when no reverse proxy fronts the application
    pub proxy_url: Option<String>,
}

impl VerificationTargets {
    /// Targets for an installation described by `config`
    pub fn for_install(config: &Configuration) -> Self {
        let mut services = vec![SERVICE_NAME.to_string()];
        if let Some(proxy) = config.web_server().service() {
            services.push(proxy.to_string());
        }

        Self {
            files: vec![
                config.backend_dir().join("server.py"),
                config.backend_dir().join(".env"),
                config.build_dir().join("index.html"),
                generate::unit_path(),
            ],
            services,
            backend_python: Some(config.backend_dir().join("venv/bin/python")),
            datastore_port: DATASTORE_PORT,
            health_url: format!("http://localhost:{APP_PORT}{HEALTH_PATH}"),
            proxy_url: (config.web_server() != WebServer::Standalone)
                .then(|| "http://localhost/".to_string()),
        }
    }
}

/// Timeouts for one pass
#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    /// Per-request timeout for TCP and HTTP probes
    pub timeout: Duration,
    /// Pause before a failed service or HTTP check is retried once
    pub recheck_delay: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            recheck_delay: Duration::from_secs(5),
        }
    }
}

/// Runs a verification pass against the host
pub struct Verifier<'a> {
    pub exec: &'a mut Executor,
    pub services: &'a dyn ServiceManager,
    pub network: &'a dyn NetworkProbe,
    pub layout: &'a Layout,
    pub options: ProbeOptions,
}

impl Verifier<'_> {
    pub fn verify(&mut self, targets: &VerificationTargets) -> VerificationReport {
        let mut report = VerificationReport::default();

        for file in &targets.files {
            let passed = self.layout.exists(file);
            self.record(
                &mut report,
                format!("{} exists", file.display()),
                passed,
                if passed { "present" } else { "missing" }.to_string(),
            );
        }

        if let Some(python) = &targets.backend_python {
            let python = python.display().to_string();
            let result = self.exec.probe(&[python.as_str(), "-c", BACKEND_IMPORTS]);
            self.record(
                &mut report,
                "Backend Python dependencies importable".to_string(),
                result.succeeded,
                if result.succeeded {
                    "fastapi, pymongo, reportlab".to_string()
                } else {
                    result.stderr.trim().to_string()
                },
            );
        }

        for unit in &targets.services {
            let passed = self.with_recheck(|v| v.services.is_active(v.exec, unit));
            self.record(
                &mut report,
                format!("{unit} service active"),
                passed,
                if passed { "active" } else { "inactive" }.to_string(),
            );
        }

        let datastore = self
            .network
            .tcp_reachable("127.0.0.1", targets.datastore_port, self.options.timeout);
        self.record(
            &mut report,
            format!("Datastore reachable on port {}", targets.datastore_port),
            datastore,
            if datastore { "accepting connections" } else { "connection failed" }.to_string(),
        );

        let (passed, detail) = self.check_http(&targets.health_url, &[200]);
        self.record(&mut report, "Backend health check".to_string(), passed, detail);

        if let Some(url) = &targets.proxy_url {
            // 404 still proves the proxy is serving
            let (passed, detail) = self.check_http(url, &[200, 404]);
            self.record(&mut report, "Reverse proxy responding".to_string(), passed, detail);
        }

        report
    }

    fn check_http(&mut self, url: &str, accepted: &[u16]) -> (bool, String) {
        let mut last = String::new();
        let passed = self.with_recheck(|v| {
            match v.network.http_status(url, v.options.timeout) {
                Ok(status) => {
                    last = format!("HTTP {status}");
                    accepted.contains(&status)
                }
                Err(reason) => {
                    last = reason;
                    false
                }
            }
        });
        (passed, format!("{url}: {last}"))
    }

    /// Run `check`, and once more after the recheck delay if it failed
    fn with_recheck(&mut self, mut check: impl FnMut(&mut Self) -> bool) -> bool {
        if check(self) {
            return true;
        }
        if !self.options.recheck_delay.is_zero() {
            thread::sleep(self.options.recheck_delay);
        }
        check(self)
    }

    fn record(&mut self, report: &mut VerificationReport, name: String, passed: bool, detail: String) {
        if passed {
            self.exec.success(&name);
        } else {
            self.exec.warn(&format!("{name}: {detail}"));
        }
        report.items.push(VerificationItem {
            name,
            passed,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use crate::system::systemd::Systemd;
    use crate::test_support::{FakeNetwork, Reply, ScriptedRunner};
    use tempfile::TempDir;

    fn config(web_server: WebServer) -> Configuration {
        Configuration::builder("poll.example.com")
            .web_server(web_server)
            .build()
            .unwrap()
    }

    fn options() -> ProbeOptions {
        ProbeOptions {
            timeout: Duration::from_millis(10),
            recheck_delay: Duration::ZERO,
        }
    }

    fn install_files(layout: &Layout, config: &Configuration) {
        for file in VerificationTargets::for_install(config).files {
            layout.write(&file, "x", None).unwrap();
        }
    }

    #[test]
    fn test_targets_skip_proxy_for_standalone() {
        let targets = VerificationTargets::for_install(&config(WebServer::Standalone));
        assert_eq!(targets.proxy_url, None);
        assert_eq!(targets.services, vec!["secret-poll".to_string()]);

        let targets = VerificationTargets::for_install(&config(WebServer::Apache));
        assert_eq!(targets.proxy_url.as_deref(), Some("http://localhost/"));
        assert!(targets.services.contains(&"apache2".to_string()));
        assert_eq!(targets.health_url, "http://localhost:8001/api/health");
    }

    #[test]
    fn test_healthy_install_passes() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::rooted(temp.path());
        let config = config(WebServer::Nginx);
        install_files(&layout, &config);

        let runner = ScriptedRunner::new().on("systemctl is-active", Reply::Output("active\n"));
        let mut exec = Executor::new(
            Box::new(runner),
            RunContext::open(temp.path().join("log")).quiet(),
        );
        let network = FakeNetwork::healthy();

        let report = Verifier {
            exec: &mut exec,
            services: &Systemd,
            network: &network,
            layout: &layout,
            options: options(),
        }
        .verify(&VerificationTargets::for_install(&config));

        assert!(report.all_passed(), "{:?}", report.failures().collect::<Vec<_>>());
    }

    #[test]
    fn test_failures_are_reported_not_raised() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::rooted(temp.path());
        let config = config(WebServer::Nginx);

        let runner = ScriptedRunner::new()
            .on("systemctl is-active", Reply::Output("inactive\n"))
            .on("/opt/secret-poll/backend/venv/bin/python", Reply::Exit(1));
        let calls = runner.calls();
        let mut exec = Executor::new(
            Box::new(runner),
            RunContext::open(temp.path().join("log")).quiet(),
        );
        let mut network = FakeNetwork::default();
        network
            .statuses
            .insert("http://localhost/".to_string(), 404);

        let report = Verifier {
            exec: &mut exec,
            services: &Systemd,
            network: &network,
            layout: &layout,
            options: options(),
        }
        .verify(&VerificationTargets::for_install(&config));

        // 4 files, imports, 2 services, datastore, health; the proxy passes on 404
        assert_eq!(report.failed(), 9);
        assert!(report.items.last().unwrap().passed);

        // Each inactive service is asked twice
        let status_queries = calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with("systemctl is-active"))
            .count();
        assert_eq!(status_queries, 4);
    }
}
