use std::path::PathBuf;

use clap::Parser;

use super::ConfigArgs;
use crate::context::DEFAULT_LOG_FILE;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Interactive installation:\n    sudo stagehand install\n\n\
                   HTTPS behind nginx:\n    sudo stagehand install --domain poll.example.com --email admin@example.com --yes\n\n\
                   HTTP on an IP address:\n    sudo stagehand install --domain 203.0.113.10 --yes\n\n\
                   From an answers file:\n    sudo stagehand install --answers answers.yaml --yes")]
pub struct InstallArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Directory containing the backend/ and frontend/ sources
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source_dir: PathBuf,

    /// Installation log file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_LOG_FILE, env = "STAGEHAND_LOG_FILE")]
    pub log_file: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}
