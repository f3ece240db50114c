use std::path::PathBuf;

use clap::Parser;

/// Arguments for the check command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Assess this host:\n    stagehand check\n\n\
                   Without network access:\n    stagehand check --offline\n\n\
                   Check sources in another directory:\n    stagehand check --source-dir /tmp/secret-poll")]
pub struct CheckArgs {
    /// Directory containing the backend/ and frontend/ sources
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source_dir: PathBuf,

    /// Skip checks that need internet access
    #[arg(long)]
    pub offline: bool,

    /// Print the findings as JSON
    #[arg(long)]
    pub json: bool,
}
