use clap::Parser;

use super::ConfigArgs;

/// Arguments for the verify command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Verify the default installation:\n    stagehand verify\n\n\
                   Verify an Apache deployment in a custom directory:\n    stagehand verify --web-server apache --install-dir /srv/poll\n\n\
                   Machine-readable report, failing on any problem:\n    stagehand verify --json --strict")]
pub struct VerifyArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with an error when any check fails
    #[arg(long)]
    pub strict: bool,
}
