//! Common test utilities for stagehand integration tests

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// Environment variables that would otherwise leak operator settings into tests
const STAGEHAND_ENV: &[&str] = &[
    "STAGEHAND_DOMAIN",
    "STAGEHAND_EMAIL",
    "STAGEHAND_ANSWERS",
    "STAGEHAND_LOG_FILE",
];

/// The real stagehand binary with a clean environment
#[allow(deprecated)]
pub fn stagehand_cmd() -> Command {
    let mut cmd = Command::cargo_bin("stagehand").unwrap();
    for var in STAGEHAND_ENV {
        cmd.env_remove(var);
    }
    cmd
}

/// Scratch directory for answers files, sources and run logs
pub struct Scratch {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub path: PathBuf,
}

impl Scratch {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file relative to the scratch root
    #[allow(dead_code)]
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    #[allow(dead_code)]
    pub fn log_file(&self) -> PathBuf {
        self.path.join("install.log")
    }
}
