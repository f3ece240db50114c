//! Step 2: clear out anything that would conflict with the new deployment
//!
//! Every action here is best effort. A service that will not stop or a port
//! that stays busy is reported and left for the later steps to trip over.

use super::StepEnv;
use crate::config::APP_PORT;
use crate::context::Logger;
use crate::error::Result;
use crate::exec::Invocation;
use crate::sequencer::StepStatus;
use crate::system::ServiceAction;

/// Web servers that would fight over ports 80 and 443
pub const CONFLICTING_SERVICES: [&str; 4] = ["apache2", "nginx", "httpd", "lighttpd"];

/// Ports whose listeners are terminated
pub const CONFLICTING_PORTS: [u16; 3] = [80, 443, APP_PORT];

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    env.step("Cleaning environment");

    for service in CONFLICTING_SERVICES {
        if env.tools.services.is_active(&mut env.exec, service) {
            env.info(&format!("Stopping conflicting service: {service}"));
            env.tools
                .services
                .control(&mut env.exec, ServiceAction::Stop, service, true)?;
            env.tools
                .services
                .control(&mut env.exec, ServiceAction::Disable, service, true)?;
        }
    }

    env.info("Cleaning package cache");
    env.tools.packages.tidy(&mut env.exec);

    let install_dir = env.install_dir_hint().to_path_buf();
    if env.layout.exists(&install_dir) {
        env.warn(&format!(
            "Removing existing installation at {}",
            install_dir.display()
        ));
        if let Err(e) = env.layout.remove_dir_all(&install_dir) {
            env.warn(&e.to_string());
        }
    }

    for port in CONFLICTING_PORTS {
        let port_arg = format!(":{port}");
        let listing = env.exec.probe(&["lsof", "-ti", port_arg.as_str()]);
        for pid in listeners(&listing.stdout) {
            env.warn(&format!("Killing process on port {port} (PID: {pid})"));
            env.exec
                .execute(Invocation::new(["kill", "-9", pid]).ignore_errors())?;
        }
    }

    env.success("Environment cleanup completed");
    Ok(StepStatus::Completed)
}

/// PIDs printed by `lsof -t`, one per line
fn listeners(output: &str) -> impl Iterator<Item = &str> {
    output
        .lines()
        .map(str::trim)
        .filter(|pid| !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeHost, Reply, ScriptedRunner, http_answers, step_env};
    use tempfile::TempDir;

    #[test]
    fn test_listener_parsing() {
        let pids: Vec<&str> = listeners("1234\n  5678 \n\nbogus\n").collect();
        assert_eq!(pids, ["1234", "5678"]);
    }

    #[test]
    fn test_cleanup_stops_services_and_kills_listeners() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on("systemctl is-active apache2", Reply::Output("active\n"))
            .on("systemctl stop apache2", Reply::Exit(1))
            .on("lsof -ti :80", Reply::Output("4242\n"))
            .on("kill -9 4242", Reply::Exit(1));
        let calls = runner.calls();
        let mut env = step_env(temp.path(), runner, FakeHost::default(), http_answers());
        env.layout
            .write("/opt/secret-poll/backend/server.py", "old", None)
            .unwrap();

        assert_eq!(run(&mut env).unwrap(), StepStatus::Completed);

        let calls = calls.borrow();
        assert!(calls.contains(&"systemctl stop apache2".to_string()));
        assert!(calls.contains(&"systemctl disable apache2".to_string()));
        assert!(!calls.contains(&"systemctl stop nginx".to_string()));
        assert!(calls.contains(&"apt-get autoremove -y".to_string()));
        assert!(calls.contains(&"kill -9 4242".to_string()));
        assert!(!env.layout.exists("/opt/secret-poll"));

        let log = env.exec.ctx().tail(100).join("\n");
        assert!(log.contains("Killing process on port 80 (PID: 4242)"));
        assert!(log.contains("Continuing despite error"));
    }
}
