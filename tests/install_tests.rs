//! Install command integration tests that are safe to run on a developer host

mod common;

use common::{Scratch, stagehand_cmd};
use predicates::prelude::*;

fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[test]
fn test_install_refuses_without_root() {
    if running_as_root() {
        return;
    }
    let scratch = Scratch::new();

    stagehand_cmd()
        .args(["install", "--domain", "poll.example.com", "--yes", "--log-file"])
        .arg(scratch.log_file())
        .arg("--source-dir")
        .arg(&scratch.path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be run as root"))
        .stderr(predicate::str::contains("Full log"));

    let log = std::fs::read_to_string(scratch.log_file()).unwrap();
    assert!(log.contains("PROGRESS: Step 1/12"));
    assert!(!log.contains("Step 2/12"));
}

#[test]
fn test_check_offline_reports_grade() {
    let scratch = Scratch::new();

    // Exit status depends on the host; the summary is always printed
    stagehand_cmd()
        .args(["check", "--offline", "--source-dir"])
        .arg(&scratch.path)
        .assert()
        .stdout(predicate::str::contains("Grade:"));
}
