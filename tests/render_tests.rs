//! Integration tests for `stagehand render`

mod common;

use common::{Scratch, stagehand_cmd};
use predicates::prelude::*;

#[test]
fn test_render_nginx_site_http() {
    stagehand_cmd()
        .args(["render", "proxy-site", "--domain", "192.0.2.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("server_name 192.0.2.5;"))
        .stdout(predicate::str::contains("listen 80;"))
        .stdout(predicate::str::contains("listen 443").not());
}

#[test]
fn test_render_nginx_site_tls() {
    stagehand_cmd()
        .args([
            "render",
            "proxy-site",
            "--domain",
            "poll.example.com",
            "--email",
            "admin@example.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("listen 443 ssl"))
        .stdout(predicate::str::contains(
            "/etc/letsencrypt/live/poll.example.com/privkey.pem",
        ));
}

#[test]
fn test_render_ip_address_never_gets_tls() {
    stagehand_cmd()
        .args([
            "render",
            "proxy-site",
            "--domain",
            "192.0.2.5",
            "--email",
            "admin@example.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("listen 443").not());
}

#[test]
fn test_render_apache_site() {
    stagehand_cmd()
        .args([
            "render",
            "proxy-site",
            "--domain",
            "poll.example.com",
            "--web-server",
            "apache",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("<VirtualHost *:80>"));
}

#[test]
fn test_render_unit_with_custom_install_dir() {
    stagehand_cmd()
        .args([
            "render",
            "unit",
            "--domain",
            "poll.example.com",
            "--install-dir",
            "/srv/poll",
            "--datastore-unit",
            "mongodb",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("WorkingDirectory=/srv/poll/backend"))
        .stdout(predicate::str::contains("mongodb.service"));
}

#[test]
fn test_render_backend_env_hides_secret() {
    stagehand_cmd()
        .args(["render", "backend-env", "--domain", "poll.example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "MONGO_URL=mongodb://localhost:27017/secret_poll",
        ))
        .stdout(predicate::str::contains("<generated-during-install>"));
}

#[test]
fn test_render_from_answers_file() {
    let scratch = Scratch::new();
    let answers = scratch.write_file(
        "answers.yaml",
        "domain: poll.example.com\nenable_ssl: true\nssl_email: admin@example.com\n",
    );

    stagehand_cmd()
        .args(["render", "frontend-env", "--answers"])
        .arg(&answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("https://poll.example.com"));
}

#[test]
fn test_render_standalone_has_no_proxy_site() {
    stagehand_cmd()
        .args([
            "render",
            "proxy-site",
            "--domain",
            "poll.example.com",
            "--web-server",
            "standalone",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not apply"));
}

#[test]
fn test_render_requires_domain() {
    stagehand_cmd()
        .args(["render", "unit"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--domain"));
}

#[test]
fn test_render_rejects_malformed_answers_file() {
    let scratch = Scratch::new();
    let answers = scratch.write_file("answers.yaml", "domain: [unterminated\n");

    stagehand_cmd()
        .args(["render", "unit", "--answers"])
        .arg(&answers)
        .assert()
        .code(1);
}
