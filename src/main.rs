//! Stagehand - staged installer for Secret Poll
//!
//! Turns a fresh Debian/Ubuntu host into a running Secret Poll deployment:
//! system packages, the Node.js runtime and MongoDB, the application itself,
//! a reverse proxy with optional TLS, a systemd service and a firewall.

use clap::Parser;

mod cli;
mod commands;
mod common;
mod config;
mod context;
mod error;
mod exec;
mod fallback;
mod generate;
mod progress;
mod readiness;
mod sequencer;
mod steps;
mod system;
mod telemetry;
#[cfg(test)]
mod test_support;
mod ui;
mod verify;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(args),
        Commands::Verify(args) => commands::verify::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
