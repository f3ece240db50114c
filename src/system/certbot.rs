//! certbot certificate issuer

use std::path::Path;

use super::{CertificateIssuer, PackageInstaller};
use crate::config::WebServer;
use crate::error::Result;
use crate::exec::{Executor, Invocation};

#[derive(Debug, Default)]
pub struct Certbot;

impl Certbot {
    fn plugin(web_server: WebServer) -> Option<&'static str> {
        match web_server {
            WebServer::Nginx => Some("python3-certbot-nginx"),
            WebServer::Apache => Some("python3-certbot-apache"),
            WebServer::Standalone => None,
        }
    }
}

impl CertificateIssuer for Certbot {
    fn install(
        &self,
        exec: &mut Executor,
        packages: &dyn PackageInstaller,
        web_server: WebServer,
    ) -> Result<()> {
        packages.install(exec, &["certbot"], "Installing Certbot")?;
        if let Some(plugin) = Self::plugin(web_server) {
            packages.install(exec, &[plugin], "Installing Certbot proxy plugin")?;
        }
        Ok(())
    }

    fn obtain(
        &self,
        exec: &mut Executor,
        webroot: &Path,
        domain: &str,
        email: &str,
    ) -> Result<()> {
        let webroot = webroot.display().to_string();
        exec.execute(
            Invocation::new([
                "certbot",
                "certonly",
                "--webroot",
                "-w",
                webroot.as_str(),
                "-d",
                domain,
                "--email",
                email,
                "--agree-tos",
                "--non-interactive",
                "--expand",
            ])
            .describe("Obtaining SSL certificate"),
        )?;
        Ok(())
    }

    fn certificate_dates(&self, exec: &mut Executor, certificate: &Path) -> Option<Vec<String>> {
        let certificate = certificate.display().to_string();
        let result = exec.probe(&[
            "openssl",
            "x509",
            "-in",
            certificate.as_str(),
            "-noout",
            "-dates",
        ]);
        if !result.succeeded {
            return None;
        }
        Some(
            result
                .stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }
}
