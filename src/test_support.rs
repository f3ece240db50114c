//! Test doubles shared by the unit tests

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::config::{Answers, PresetSource};
use crate::context::{Level, Logger, RunContext};
use crate::error::Result;
use crate::exec::{CommandRunner, Executor, RunOutcome, RunRequest};
use crate::steps::{StepEnv, Timings};
use crate::system::{HostProbe, Layout, Toolbox};
use crate::verify::NetworkProbe;

/// Collects log entries in memory
#[derive(Debug, Default)]
pub struct MemoryLog {
    pub entries: Vec<(Level, String)>,
}

impl MemoryLog {
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|(_, message)| message.contains(needle))
    }
}

impl Logger for MemoryLog {
    fn log(&mut self, level: Level, message: &str) {
        self.entries.push((level, message.to_string()));
    }
}

/// Canned answer for a scripted command
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Output(&'static str),
    Exit(i32),
    NotFound,
    TimedOut,
    /// Ctrl-C arrives while the command runs
    Interrupted,
}

/// Answers commands by command-line prefix; unmatched commands succeed silently
///
/// The longest matching prefix wins, earlier rules break ties.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Reply)>,
    calls: Rc<RefCell<Vec<String>>>,
    interrupted: bool,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, prefix: &str, reply: Reply) -> Self {
        self.rules.push((prefix.to_string(), reply));
        self
    }

    /// Command lines seen so far, shared with the runner
    pub fn calls(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.calls)
    }
}

impl CommandRunner for ScriptedRunner {
    fn interrupted(&self) -> bool {
        self.interrupted
    }

    fn run(&mut self, request: RunRequest<'_>) -> RunOutcome {
        let line = request.argv.join(" ");
        self.calls.borrow_mut().push(line.clone());

        let reply = self
            .rules
            .iter()
            .rev()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, reply)| *reply);

        match reply {
            None => RunOutcome::success(""),
            Some(Reply::Output(stdout)) => RunOutcome::success(stdout),
            Some(Reply::Exit(code)) => RunOutcome::failure(code),
            Some(Reply::NotFound) => RunOutcome::NotFound,
            Some(Reply::TimedOut) => RunOutcome::TimedOut,
            Some(Reply::Interrupted) => {
                self.interrupted = true;
                RunOutcome::Interrupted
            }
        }
    }
}

/// A host with fixed facts
#[derive(Debug, Clone)]
pub struct FakeHost {
    pub privileged: bool,
    pub disk_bytes: u64,
    pub memory_available: Option<u64>,
    pub memory_total: Option<u64>,
    pub os_release: Option<String>,
    pub resolves_to: Option<IpAddr>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            privileged: true,
            disk_bytes: 50 * 1024 * 1024 * 1024,
            memory_available: Some(4 * 1024 * 1024 * 1024),
            memory_total: Some(8 * 1024 * 1024 * 1024),
            os_release: Some("NAME=\"Ubuntu\"\nID=ubuntu\n".to_string()),
            resolves_to: Some(IpAddr::from([203, 0, 113, 10])),
        }
    }
}

impl HostProbe for FakeHost {
    fn is_privileged(&self) -> bool {
        self.privileged
    }

    fn available_disk_bytes(&self, _path: &Path) -> Result<u64> {
        Ok(self.disk_bytes)
    }

    fn available_memory_bytes(&self) -> Option<u64> {
        self.memory_available
    }

    fn total_memory_bytes(&self) -> Option<u64> {
        self.memory_total
    }

    fn os_release(&self) -> Option<String> {
        self.os_release.clone()
    }

    fn resolve(&self, _domain: &str) -> Option<IpAddr> {
        self.resolves_to
    }
}

/// A network where only the listed ports and URLs answer
#[derive(Debug, Default, Clone)]
pub struct FakeNetwork {
    pub open_ports: HashSet<u16>,
    pub statuses: HashMap<String, u16>,
}

impl FakeNetwork {
    /// Datastore listening, backend healthy, proxy serving the app
    pub fn healthy() -> Self {
        let mut network = Self::default();
        network.open_ports.insert(27017);
        network
            .statuses
            .insert("http://localhost:8001/api/health".to_string(), 200);
        network
            .statuses
            .insert("http://localhost/".to_string(), 200);
        network
    }
}

impl NetworkProbe for FakeNetwork {
    fn tcp_reachable(&self, _host: &str, port: u16, _timeout: Duration) -> bool {
        self.open_ports.contains(&port)
    }

    fn http_status(&self, url: &str, _timeout: Duration) -> std::result::Result<u16, String> {
        self.statuses
            .get(url)
            .copied()
            .ok_or_else(|| "connection refused".to_string())
    }
}

/// A step environment rooted in `root`, driven by `runner`
pub fn step_env(root: &Path, runner: ScriptedRunner, host: FakeHost, answers: Answers) -> StepEnv {
    let exec = Executor::new(
        Box::new(runner),
        RunContext::open(root.join("install.log")).quiet(),
    );
    let install_dir = answers
        .install_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("/opt/secret-poll"));
    StepEnv::new(
        exec,
        Toolbox::system(),
        Box::new(host),
        Box::new(FakeNetwork::healthy()),
        Layout::rooted(root.join("host")),
        Timings::instant(),
        Box::new(PresetSource::new(answers, true)),
        install_dir,
        root.join("source"),
    )
}

/// Answers for an HTTPS deployment behind nginx
pub fn tls_answers() -> Answers {
    Answers::from_yaml(
        "domain: poll.example.com\nenable_ssl: true\nssl_email: admin@example.com\nweb_server: nginx\n",
    )
    .unwrap()
}

/// Answers for a plain HTTP deployment
pub fn http_answers() -> Answers {
    Answers::from_yaml("domain: 192.0.2.5\nweb_server: nginx\n").unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(runner: &mut ScriptedRunner, argv: &[&str]) -> RunOutcome {
        let argv: Vec<String> = argv.iter().map(|arg| arg.to_string()).collect();
        runner.run(RunRequest {
            argv: &argv,
            cwd: None,
            capture: true,
            stream_to: None,
            timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut runner = ScriptedRunner::new()
            .on("systemctl is-active mongod", Reply::Output("inactive\n"))
            .on("systemctl is-active mongodb", Reply::Exit(3))
            .on("systemctl is-active", Reply::Output("active\n"));

        assert_eq!(
            reply(&mut runner, &["systemctl", "is-active", "mongodb"]),
            RunOutcome::failure(3)
        );
        assert_eq!(
            reply(&mut runner, &["systemctl", "is-active", "mongod"]),
            RunOutcome::success("inactive\n")
        );
        assert_eq!(
            reply(&mut runner, &["systemctl", "is-active", "nginx"]),
            RunOutcome::success("active\n")
        );
    }
}
