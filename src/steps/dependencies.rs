//! Step 4: system packages, the JavaScript runtime and the datastore
//!
//! The runtime and the datastore come from fallback chains because no single
//! installation method works on every host. The runtime is mandatory; when
//! every datastore method fails the run continues and the operator is told to
//! provide one by hand.

use super::StepEnv;
use crate::common::version::Version;
use crate::config::DATASTORE_PORT;
use crate::context::Logger;
use crate::error::{Result, StagehandError};
use crate::exec::Invocation;
use crate::fallback::{FallbackChain, Strategy};
use crate::sequencer::StepStatus;

pub const BASE_PACKAGES: [&str; 10] = [
    "curl",
    "wget",
    "git",
    "unzip",
    "software-properties-common",
    "apt-transport-https",
    "ca-certificates",
    "gnupg",
    "lsb-release",
    "lsof",
];

pub const PYTHON_PACKAGES: [&str; 5] = [
    "python3",
    "python3-pip",
    "python3-venv",
    "python3-dev",
    "build-essential",
];

/// Oldest runtime major version the frontend toolchain accepts
pub const MIN_NODE_MAJOR: u32 = 18;

pub const RUNTIME_CAPABILITY: &str = "Node.js runtime";
pub const DATASTORE_CAPABILITY: &str = "MongoDB datastore";

const NODESOURCE_SETUP_URL: &str = "https://deb.nodesource.com/setup_20.x";
const NODESOURCE_SCRIPT: &str = "/tmp/nodejs_setup.sh";

const MONGODB_KEY_URL: &str = "https://www.mongodb.org/static/pgp/server-7.0.asc";
const MONGODB_KEY_FILE: &str = "/tmp/mongodb.asc";
const MONGODB_KEYRING: &str = "/usr/share/keyrings/mongodb-server-7.0.gpg";
const MONGODB_SOURCE_LIST: &str = "/etc/apt/sources.list.d/mongodb-org-7.0.list";

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let web_server = env.config()?.web_server();

    env.step("Installing system dependencies");
    env.tools.packages.refresh(&mut env.exec)?;
    env.tools
        .packages
        .install(&mut env.exec, &BASE_PACKAGES, "Installing base packages")?;
    env.tools
        .packages
        .install(&mut env.exec, &PYTHON_PACKAGES, "Installing Python toolchain")?;

    let runtime = runtime_chain().resolve(env);
    let provider = runtime.require()?;
    env.record_capability(RUNTIME_CAPABILITY, &provider);

    let datastore = datastore_chain().resolve(env);
    env.record_capability(
        DATASTORE_CAPABILITY,
        datastore.strategy().unwrap_or("exhausted"),
    );
    if datastore.is_exhausted() {
        let tried: Vec<&str> = datastore
            .attempts()
            .iter()
            .map(|attempt| attempt.strategy.as_str())
            .collect();
        env.error(&format!(
            "All MongoDB installation methods failed (tried {})",
            tried.join(", ")
        ));
        env.warn("MongoDB must be installed manually and listen on localhost:27017");
    }

    if let Some(package) = web_server.service() {
        env.tools.packages.install(
            &mut env.exec,
            &[package],
            &format!("Installing {}", web_server.display_name()),
        )?;
    }

    env.success("System dependencies installed");
    if datastore.is_exhausted() {
        return Ok(StepStatus::Degraded(
            "no MongoDB installation method succeeded".to_string(),
        ));
    }
    Ok(StepStatus::Completed)
}

/// Ways of installing a compatible Node.js
pub fn runtime_chain() -> FallbackChain<'static, StepEnv> {
    FallbackChain::new(RUNTIME_CAPABILITY)
        .then(
            Strategy::new("nodesource", |env: &mut StepEnv| {
                env.exec.execute(
                    Invocation::new(["curl", "-fsSL", NODESOURCE_SETUP_URL, "-o", NODESOURCE_SCRIPT])
                        .describe("Downloading NodeSource setup script"),
                )?;
                env.exec.execute(
                    Invocation::new(["bash", NODESOURCE_SCRIPT])
                        .describe("Adding NodeSource repository"),
                )?;
                env.tools
                    .packages
                    .install(&mut env.exec, &["nodejs"], "Installing Node.js 20")
            })
            .verified_by(runtime_is_compatible),
        )
        .then(
            Strategy::new("distribution", |env: &mut StepEnv| {
                env.tools.packages.install(
                    &mut env.exec,
                    &["nodejs", "npm"],
                    "Installing Node.js from distribution repositories",
                )
            })
            .verified_by(runtime_is_compatible),
        )
}

/// Ways of getting a running MongoDB
pub fn datastore_chain() -> FallbackChain<'static, StepEnv> {
    FallbackChain::new(DATASTORE_CAPABILITY)
        .then(Strategy::new("official-repository", install_official_mongodb).verified_by(datastore_is_active))
        .then(
            Strategy::new("distribution-repository", install_distribution_mongodb)
                .verified_by(datastore_is_active),
        )
        .then(Strategy::new("snap", |env: &mut StepEnv| {
            env.exec.execute(
                Invocation::new(["snap", "install", "mongodb"]).describe("Installing MongoDB via snap"),
            )?;
            Ok(())
        }))
}

/// Equivalent `gpg --dearmor` invocations; gpg builds differ in what they accept
pub fn signing_key_chain() -> FallbackChain<'static, StepEnv> {
    let dearmor = |name: &'static str, argv: Vec<String>| {
        Strategy::new(name, move |env: &mut StepEnv| {
            env.exec.run(&argv[..])?;
            Ok(())
        })
    };

    FallbackChain::new("MongoDB repository signing key")
        .then(dearmor(
            "gpg-pipe",
            shell(&format!(
                "cat {MONGODB_KEY_FILE} | gpg --dearmor --batch --yes -o {MONGODB_KEYRING}"
            )),
        ))
        .then(dearmor(
            "gpg-redirect",
            shell(&format!(
                "gpg --dearmor --batch --yes < {MONGODB_KEY_FILE} > {MONGODB_KEYRING}"
            )),
        ))
        .then(dearmor(
            "gpg-output-flag",
            [
                "gpg",
                "--dearmor",
                "--batch",
                "--yes",
                "--output",
                MONGODB_KEYRING,
                MONGODB_KEY_FILE,
            ]
            .map(String::from)
            .to_vec(),
        ))
}

fn shell(script: &str) -> Vec<String> {
    vec!["bash".to_string(), "-c".to_string(), script.to_string()]
}

fn install_official_mongodb(env: &mut StepEnv) -> Result<()> {
    env.exec.execute(
        Invocation::new(["curl", "-fsSL", MONGODB_KEY_URL, "-o", MONGODB_KEY_FILE])
            .describe("Downloading MongoDB signing key"),
    )?;
    signing_key_chain().resolve(env).require()?;

    let codename = env.exec.output(&["lsb_release", "-cs"])?;
    let line = repository_line(&codename)?;
    env.layout
        .write(MONGODB_SOURCE_LIST, &format!("{line}\n"), None)?;
    env.info(&format!("Added MongoDB repository for {codename}"));

    env.tools.packages.refresh(&mut env.exec)?;
    env.tools.packages.install(
        &mut env.exec,
        &["mongodb-org"],
        "Installing MongoDB from the official repository",
    )?;
    env.tools.services.enable_and_start(&mut env.exec, "mongod")?;
    env.facts.datastore_unit = Some("mongod".to_string());
    Ok(())
}

fn install_distribution_mongodb(env: &mut StepEnv) -> Result<()> {
    env.tools.packages.install(
        &mut env.exec,
        &["mongodb"],
        "Installing MongoDB from distribution repositories",
    )?;

    // The package names its unit differently across releases
    let unit = ["mongod", "mongodb"]
        .into_iter()
        .find(|unit| env.tools.services.has_unit(&mut env.exec, unit));
    match unit {
        Some(unit) => {
            env.tools.services.enable_and_start(&mut env.exec, unit)?;
            env.facts.datastore_unit = Some(unit.to_string());
        }
        None => env.warn("MongoDB installed but no service unit was found"),
    }
    Ok(())
}

/// apt source entry for the official MongoDB 7.0 repository
pub fn repository_line(codename: &str) -> Result<String> {
    if codename.is_empty() || !codename.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(StagehandError::HostProbeFailed {
            reason: format!("unexpected distribution codename '{codename}'"),
        });
    }
    Ok(format!(
        "deb [ arch=amd64,arm64 signed-by={MONGODB_KEYRING} ] \
         https://repo.mongodb.org/apt/ubuntu {codename}/mongodb-org/7.0 multiverse"
    ))
}

fn runtime_is_compatible(env: &mut StepEnv) -> bool {
    let result = env.exec.probe(&["node", "--version"]);
    match Version::parse(result.stdout_trimmed()) {
        Some(version) if version.major >= MIN_NODE_MAJOR => {
            env.success(&format!("Node.js {version} installed"));
            true
        }
        Some(version) => {
            env.warn(&format!(
                "Node.js {version} is too old; {MIN_NODE_MAJOR}+ is required"
            ));
            false
        }
        None => {
            env.warn("Could not determine the installed Node.js version");
            false
        }
    }
}

fn datastore_is_active(env: &mut StepEnv) -> bool {
    env.settle(env.timings.service_settle);

    let units: Vec<String> = match &env.facts.datastore_unit {
        Some(unit) => vec![unit.clone()],
        None => vec!["mongod".to_string(), "mongodb".to_string()],
    };
    if units
        .iter()
        .any(|unit| env.tools.services.is_active(&mut env.exec, unit))
    {
        return true;
    }
    env.network.tcp_reachable(
        "127.0.0.1",
        DATASTORE_PORT,
        env.timings.probes.timeout,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeHost, FakeNetwork, Reply, ScriptedRunner, step_env, tls_answers};
    use tempfile::TempDir;

    fn collected_env(temp: &TempDir, runner: ScriptedRunner) -> StepEnv {
        let mut env = step_env(temp.path(), runner, FakeHost::default(), tls_answers());
        super::super::collect::run(&mut env).unwrap();
        env
    }

    #[test]
    fn test_repository_line() {
        assert_eq!(
            repository_line("jammy").unwrap(),
            "deb [ arch=amd64,arm64 signed-by=/usr/share/keyrings/mongodb-server-7.0.gpg ] \
             https://repo.mongodb.org/apt/ubuntu jammy/mongodb-org/7.0 multiverse"
        );
        assert!(repository_line("jammy; rm -rf /").is_err());
        assert!(repository_line("").is_err());
    }

    #[test]
    fn test_happy_path_uses_first_strategies() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on("node --version", Reply::Output("v20.11.1\n"))
            .on("lsb_release -cs", Reply::Output("jammy\n"))
            .on("systemctl is-active mongod", Reply::Output("active\n"));
        let calls = runner.calls();
        let mut env = collected_env(&temp, runner);

        assert_eq!(run(&mut env).unwrap(), StepStatus::Completed);
        assert_eq!(env.facts.capabilities[RUNTIME_CAPABILITY], "nodesource");
        assert_eq!(env.facts.capabilities[DATASTORE_CAPABILITY], "official-repository");
        assert_eq!(env.facts.datastore_unit(), "mongod");
        assert!(
            env.layout
                .read(MONGODB_SOURCE_LIST)
                .unwrap()
                .contains("jammy/mongodb-org/7.0")
        );

        let calls = calls.borrow();
        assert!(calls.contains(&"apt-get install -y nginx".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("snap")));
    }

    #[test]
    fn test_runtime_falls_back_to_distribution() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on("bash /tmp/nodejs_setup.sh", Reply::Exit(1))
            .on("node --version", Reply::Output("v18.19.1\n"))
            .on("lsb_release -cs", Reply::Output("jammy\n"))
            .on("systemctl is-active mongod", Reply::Output("active\n"));
        let calls = runner.calls();
        let mut env = collected_env(&temp, runner);

        run(&mut env).unwrap();
        assert_eq!(env.facts.capabilities[RUNTIME_CAPABILITY], "distribution");
        assert!(calls.borrow().contains(&"apt-get install -y nodejs npm".to_string()));
    }

    #[test]
    fn test_old_runtime_is_fatal() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on("node --version", Reply::Output("v12.22.9\n"));
        let mut env = collected_env(&temp, runner);

        assert!(matches!(
            run(&mut env),
            Err(StagehandError::CapabilityUnavailable { .. })
        ));
    }

    #[test]
    fn test_signing_key_tries_every_syntax() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on("bash -c cat /tmp/mongodb.asc", Reply::Exit(2))
            .on("bash -c gpg --dearmor", Reply::Exit(2));
        let calls = runner.calls();
        let mut env = collected_env(&temp, runner);

        let resolution = signing_key_chain().resolve(&mut env);
        assert_eq!(resolution.strategy(), Some("gpg-output-flag"));
        assert_eq!(resolution.attempts().len(), 3);
        assert!(calls.borrow().contains(
            &"gpg --dearmor --batch --yes --output /usr/share/keyrings/mongodb-server-7.0.gpg /tmp/mongodb.asc"
                .to_string()
        ));
    }

    #[test]
    fn test_datastore_falls_through_to_snap_and_detects_unit() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on("node --version", Reply::Output("v20.11.1\n"))
            .on("curl -fsSL https://www.mongodb.org", Reply::Exit(22))
            .on(
                "systemctl list-unit-files",
                Reply::Output("mongodb.service enabled enabled\n"),
            )
            .on("systemctl is-active", Reply::Output("failed\n"));
        let calls = runner.calls();
        let mut env = collected_env(&temp, runner);
        env.network = Box::new(FakeNetwork::default());

        assert!(matches!(run(&mut env).unwrap(), StepStatus::Completed));
        assert_eq!(env.facts.capabilities[DATASTORE_CAPABILITY], "snap");
        // Detected by the distribution strategy even though it never came up
        assert_eq!(env.facts.datastore_unit(), "mongodb");
        assert!(calls.borrow().contains(&"systemctl enable mongodb".to_string()));
        assert!(calls.borrow().contains(&"snap install mongodb".to_string()));
    }

    #[test]
    fn test_datastore_exhaustion_is_soft() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on("node --version", Reply::Output("v20.11.1\n"))
            .on("curl -fsSL https://www.mongodb.org", Reply::Exit(22))
            .on("apt-get install -y mongodb", Reply::Exit(100))
            .on("snap", Reply::NotFound);
        let calls = runner.calls();
        let mut env = collected_env(&temp, runner);

        assert!(matches!(run(&mut env).unwrap(), StepStatus::Degraded(_)));
        assert_eq!(env.facts.capabilities[DATASTORE_CAPABILITY], "exhausted");
        // The proxy package is still installed afterwards
        assert!(calls.borrow().contains(&"apt-get install -y nginx".to_string()));
        let log = env.exec.ctx().tail(10).join("\n");
        assert!(log.contains("must be installed manually"));
    }
}
