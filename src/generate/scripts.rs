//! Shell scripts: certificate renewal and operator tooling

use std::fmt::Write;

use crate::config::{APP_PORT, Configuration, HEALTH_PATH, SERVICE_NAME};

/// Renew certificates quietly, then reload the proxy
pub fn renewal(proxy_service: &str) -> String {
    format!("#!/bin/bash\ncertbot renew --quiet\nsystemctl reload {proxy_service}\n")
}

pub fn status(config: &Configuration, datastore_unit: &str) -> String {
    let mut out = String::from(
        "#!/bin/bash\necho \"Secret Poll Status\"\necho \"==================\"\necho\n",
    );
    let _ = writeln!(out, "systemctl status {SERVICE_NAME} --no-pager\necho");
    let _ = writeln!(out, "systemctl status {datastore_unit} --no-pager\necho");
    if let Some(proxy) = config.web_server().service() {
        let _ = writeln!(out, "systemctl status {proxy} --no-pager\necho");
    }
    out.push_str("echo \"Application Health:\"\n");
    let _ = writeln!(
        out,
        "curl -s http://localhost:{APP_PORT}{HEALTH_PATH} || echo \"Backend not responding\""
    );
    out
}

/// `logs.sh follow` tails the journal, otherwise dumps it
pub fn logs() -> String {
    format!(
        "#!/bin/bash
if [ \"$1\" = \"follow\" ]; then
    journalctl -u {SERVICE_NAME} -f
else
    journalctl -u {SERVICE_NAME} --no-pager
fi
"
    )
}

pub fn restart(config: &Configuration) -> String {
    let mut out = format!("#!/bin/bash\nsystemctl restart {SERVICE_NAME}\n");
    if let Some(proxy) = config.web_server().service() {
        let _ = writeln!(out, "systemctl restart {proxy}");
    }
    out.push_str("echo \"Services restarted\"\n");
    out
}
