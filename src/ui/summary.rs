//! Configuration and completion summaries

use std::path::Path;

use console::Style;

use crate::config::{Configuration, SERVICE_NAME, WebServer};
use crate::sequencer::{RunReport, StepOutcome};
use crate::steps::RunFacts;

/// Label/value rows describing a configuration
pub fn configuration_rows(config: &Configuration) -> Vec<(&'static str, String)> {
    let ssl = match config.ssl_email() {
        Some(email) if config.enable_ssl() => format!("Enabled ({email})"),
        _ => "Disabled".to_string(),
    };
    vec![
        ("Domain", config.domain().to_string()),
        ("SSL", ssl),
        ("Web Server", config.web_server().display_name().to_string()),
        ("Environment", config.environment().to_string()),
        ("Install Directory", config.install_dir().display().to_string()),
    ]
}

/// Printed after a completed run
pub fn print_completion(config: &Configuration, facts: &RunFacts, log_path: &Path) {
    let header = Style::new().green().bold();
    let bold = Style::new().bold();
    let dim = Style::new().dim();
    let url = config.public_url(facts.tls_active);

    println!();
    println!("{}", header.apply_to("Secret Poll installation completed"));
    println!();
    println!("{}", bold.apply_to("Access"));
    println!("  Application: {}", Style::new().cyan().apply_to(&url));
    println!("  API:         {url}/api");
    if config.web_server() == WebServer::Standalone {
        println!(
            "  {}",
            dim.apply_to("No reverse proxy; the application answers on its own port")
        );
    }

    println!();
    println!("{}", bold.apply_to("Management"));
    let dir = config.install_dir().display();
    println!("  Status:   {dir}/status.sh");
    println!("  Logs:     {dir}/logs.sh [follow]");
    println!("  Restart:  {dir}/restart.sh");
    println!("  Service:  systemctl {{start|stop|restart|status}} {SERVICE_NAME}");

    println!();
    println!("{}", bold.apply_to("Log files"));
    println!("  Installer:   {}", log_path.display());
    println!("  Application: journalctl -u {SERVICE_NAME}");
    if let Some(proxy) = config.web_server().service() {
        println!("  Web server:  /var/log/{proxy}/");
    }

    if !facts.capabilities.is_empty() {
        println!();
        println!("{}", bold.apply_to("Dependencies"));
        for (capability, provider) in &facts.capabilities {
            println!("  {capability}: {provider}");
        }
    }

    if let Some(report) = &facts.verification {
        if !report.all_passed() {
            println!();
            println!(
                "{}",
                Style::new()
                    .yellow()
                    .apply_to(format!("{} verification check(s) failed:", report.failed()))
            );
            for item in report.failures() {
                println!("  - {}: {}", item.name, item.detail);
            }
        }
    }

    println!();
    println!("{}", bold.apply_to("Security recommendations"));
    println!("  - Keep the system updated: apt-get update && apt-get upgrade");
    println!("  - Restrict SSH access and use key authentication");
    if config.enable_ssl() && !facts.tls_active {
        println!(
            "  - Obtain a certificate: certbot certonly --webroot -w {} -d {}",
            config.build_dir().display(),
            config.domain()
        );
    }
    println!();
}

/// Printed after an aborted run
pub fn print_abort(report: &RunReport, log_path: &Path) {
    let red = Style::new().red().bold();
    eprintln!();
    if let Some(failed) = report
        .steps
        .iter()
        .rev()
        .find(|s| matches!(s.outcome, StepOutcome::Aborted(_)))
    {
        eprintln!("{} {}", red.apply_to("Stopped at:"), failed.description);
    }
    if !report.log_tail.is_empty() {
        eprintln!("{}", Style::new().bold().apply_to("Recent log entries:"));
        for line in &report.log_tail {
            eprintln!("  {line}");
        }
    }
    eprintln!("Full log: {}", log_path.display());
}
