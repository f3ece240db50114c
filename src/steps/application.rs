//! Step 5: copy the application in, build the backend environment and the frontend bundle

use super::StepEnv;
use crate::common::fs::{CopyOptions, copy_dir_recursive};
use crate::common::version::Version;
use crate::config::Configuration;
use crate::context::Logger;
use crate::error::{Result, StagehandError};
use crate::exec::Invocation;
use crate::generate::{Artifact, SecretKey};
use crate::sequencer::StepStatus;

/// Oldest runtime the frontend build toolchain supports
const FRONTEND_NODE_MINIMUM: Version = Version::new(18, 17, 0);

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    let config = env.config()?.clone();

    env.layout.create_dir_all(config.install_dir())?;
    copy_sources(env, &config)?;
    setup_backend(env, &config)?;
    setup_frontend(env, &config)?;

    env.success("Application setup completed");
    Ok(StepStatus::Completed)
}

fn copy_sources(env: &mut StepEnv, config: &Configuration) -> Result<()> {
    let options = CopyOptions::application_sources();
    for part in ["backend", "frontend"] {
        let source = env.source_dir.join(part);
        if !source.is_dir() {
            env.warn(&format!(
                "{} not found; expecting it to exist in the install directory",
                source.display()
            ));
            continue;
        }

        let target = env.layout.path(config.install_dir().join(part));
        let copied = copy_dir_recursive(&source, &target, &options).map_err(|e| {
            StagehandError::FileWriteFailed {
                path: target.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        env.info(&format!("Copied {copied} {part} files"));
    }
    Ok(())
}

fn setup_backend(env: &mut StepEnv, config: &Configuration) -> Result<()> {
    env.step("Setting up backend");
    let backend = env.layout.path(config.backend_dir());
    let pip = config.backend_dir().join("venv/bin/pip").display().to_string();

    env.exec.execute(
        Invocation::new(["python3", "-m", "venv", "venv"])
            .in_dir(&backend)
            .describe("Creating Python virtual environment"),
    )?;
    env.exec.execute(
        Invocation::new([pip.as_str(), "install", "--upgrade", "pip"])
            .in_dir(&backend)
            .describe("Upgrading pip"),
    )?;
    env.exec.execute(
        Invocation::new([pip.as_str(), "install", "-r", "requirements.txt"])
            .in_dir(&backend)
            .describe("Installing Python packages"),
    )?;

    let secret_key = SecretKey::generate(env);
    env.write_artifact(&Artifact::BackendEnv {
        secret_key: &secret_key,
    })?;
    env.success("Backend configuration created");
    Ok(())
}

fn setup_frontend(env: &mut StepEnv, config: &Configuration) -> Result<()> {
    env.step("Setting up frontend");
    let frontend = env.layout.path(config.frontend_dir());

    let node = env.exec.probe(&["node", "--version"]);
    match Version::parse(node.stdout_trimmed()) {
        Some(version) if version >= FRONTEND_NODE_MINIMUM => {
            env.success(&format!("Node.js {version} is compatible with the frontend build"));
        }
        Some(version) => {
            env.warn(&format!("Node.js {version} may be too old for the frontend build"));
            env.info("The frontend requires Node.js 18.17.0 or newer");
        }
        None => env.warn("Could not determine the Node.js version"),
    }

    // Read at build time
    env.write_artifact(&Artifact::FrontendEnv)?;
    env.success("Frontend configuration created");

    let commands: &[(&[&str], &str)] = if frontend.join("yarn.lock").exists() {
        &[
            (&["npm", "install", "-g", "yarn"], "Installing Yarn"),
            (&["yarn", "install"], "Installing frontend dependencies"),
            (&["yarn", "build"], "Building frontend"),
        ]
    } else {
        &[
            (&["npm", "install"], "Installing frontend dependencies"),
            (&["npm", "run", "build"], "Building frontend"),
        ]
    };
    for (argv, description) in commands {
        env.exec.execute(
            Invocation::new(argv.iter().copied())
                .in_dir(&frontend)
                .describe(*description),
        )?;
    }

    let index = config.build_dir().join("index.html");
    if !env.layout.exists(&index) {
        env.error("Frontend build did not produce index.html");
        return Err(StagehandError::BuildVerificationFailed {
            path: index.display().to_string(),
        });
    }
    env.success("Frontend build completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeHost, Reply, ScriptedRunner, http_answers, step_env};
    use std::fs;
    use tempfile::TempDir;

    fn write_sources(env: &StepEnv, yarn: bool) {
        let backend = env.source_dir.join("backend");
        let frontend = env.source_dir.join("frontend");
        fs::create_dir_all(&backend).unwrap();
        fs::create_dir_all(frontend.join("build")).unwrap();
        fs::write(backend.join("server.py"), "app = None\n").unwrap();
        fs::write(backend.join("requirements.txt"), "fastapi\n").unwrap();
        fs::write(frontend.join("package.json"), "{}").unwrap();
        // Stands in for the output of the build command
        fs::write(frontend.join("build/index.html"), "<html></html>").unwrap();
        if yarn {
            fs::write(frontend.join("yarn.lock"), "").unwrap();
        }
    }

    fn prepared(temp: &TempDir, runner: ScriptedRunner, yarn: bool) -> StepEnv {
        let mut env = step_env(temp.path(), runner, FakeHost::default(), http_answers());
        super::super::collect::run(&mut env).unwrap();
        write_sources(&env, yarn);
        env
    }

    #[test]
    fn test_npm_build_and_env_files() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on("node --version", Reply::Output("v20.11.1\n"));
        let calls = runner.calls();
        let mut env = prepared(&temp, runner, false);

        assert_eq!(run(&mut env).unwrap(), StepStatus::Completed);

        assert!(env.layout.exists("/opt/secret-poll/backend/server.py"));
        let backend_env = env.layout.read("/opt/secret-poll/backend/.env").unwrap();
        assert!(backend_env.contains("MONGO_URL=mongodb://localhost:27017/secret_poll"));
        assert!(env.layout.exists("/opt/secret-poll/frontend/.env"));

        let calls = calls.borrow();
        assert_eq!(calls[0], "python3 -m venv venv");
        assert_eq!(
            calls[2],
            "/opt/secret-poll/backend/venv/bin/pip install -r requirements.txt"
        );
        assert!(calls.contains(&"npm run build".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("yarn")));
    }

    #[test]
    fn test_yarn_lock_selects_yarn() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        let calls = runner.calls();
        let mut env = prepared(&temp, runner, true);

        run(&mut env).unwrap();
        let calls = calls.borrow();
        let yarn: Vec<&String> = calls
            .iter()
            .filter(|c| c.contains("yarn"))
            .collect();
        assert_eq!(
            yarn,
            ["npm install -g yarn", "yarn install", "yarn build"]
        );
    }

    #[test]
    fn test_missing_build_output_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut env = prepared(&temp, ScriptedRunner::new(), false);
        fs::remove_file(env.source_dir.join("frontend/build/index.html")).unwrap();

        assert!(matches!(
            run(&mut env),
            Err(StagehandError::BuildVerificationFailed { .. })
        ));
    }

    #[test]
    fn test_failed_pip_install_aborts() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on(
            "/opt/secret-poll/backend/venv/bin/pip install -r",
            Reply::Exit(1),
        );
        let mut env = prepared(&temp, runner, false);

        assert!(matches!(
            run(&mut env),
            Err(StagehandError::CommandFailed { .. })
        ));
    }
}
