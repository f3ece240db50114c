//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - config: configuration flags shared by install, verify and render
//! - install: Install command arguments
//! - verify: Verify command arguments
//! - check: Check command arguments
//! - render: Render command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};

pub mod check;
pub mod completions;
pub mod config;
pub mod install;
pub mod render;
pub mod verify;

pub use check::CheckArgs;
pub use completions::CompletionsArgs;
pub use config::ConfigArgs;
pub use install::InstallArgs;
pub use render::{RenderArgs, RenderTarget};
pub use verify::VerifyArgs;

/// Stagehand - staged installer for Secret Poll
///
/// Provisions a Debian/Ubuntu host with everything Secret Poll needs.
#[derive(Parser, Debug)]
#[command(
    name = "stagehand",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Staged production installer for the Secret Poll application",
    long_about = "Stagehand provisions a Debian/Ubuntu host for Secret Poll: system packages, \
                  Node.js and MongoDB, the application itself, a reverse proxy, TLS certificates, \
                  a systemd service and a firewall, verifying the result at the end.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  sudo stagehand install                                  \x1b[90m# Interactive installation\x1b[0m\n   \
                  sudo stagehand install --domain poll.example.com \\\n     \
                  --email admin@example.com --yes                         \x1b[90m# Unattended HTTPS installation\x1b[0m\n   \
                  sudo stagehand install --answers answers.yaml --yes    \x1b[90m# Install from an answers file\x1b[0m\n   \
                  stagehand check                                         \x1b[90m# Assess host readiness\x1b[0m\n   \
                  stagehand verify --json                                 \x1b[90m# Verify an existing deployment\x1b[0m\n   \
                  stagehand render proxy-site --domain poll.example.com  \x1b[90m# Preview a generated file\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install Secret Poll on this host
    Install(InstallArgs),

    /// Verify an existing installation
    Verify(VerifyArgs),

    /// Assess whether this host is ready for installation
    Check(CheckArgs),

    /// Print a generated configuration file
    Render(RenderArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
