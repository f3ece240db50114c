use clap::{Parser, ValueEnum};

use super::ConfigArgs;
use crate::generate::{Artifact, SecretKey};
use crate::steps::DEFAULT_DATASTORE_UNIT;

/// Generated file to print
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    ProxySite,
    BackendEnv,
    FrontendEnv,
    Unit,
    RenewalScript,
    StatusScript,
    LogsScript,
    RestartScript,
}

impl RenderTarget {
    pub fn artifact<'a>(
        self,
        tls: bool,
        secret_key: &'a SecretKey,
        datastore_unit: &'a str,
    ) -> Artifact<'a> {
        match self {
            RenderTarget::ProxySite => Artifact::ProxySite { tls },
            RenderTarget::BackendEnv => Artifact::BackendEnv { secret_key },
            RenderTarget::FrontendEnv => Artifact::FrontendEnv,
            RenderTarget::Unit => Artifact::SupervisorUnit { datastore_unit },
            RenderTarget::RenewalScript => Artifact::RenewalScript,
            RenderTarget::StatusScript => Artifact::StatusScript { datastore_unit },
            RenderTarget::LogsScript => Artifact::LogsScript,
            RenderTarget::RestartScript => Artifact::RestartScript,
        }
    }
}

/// Arguments for the render command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Preview the nginx site for an HTTPS deployment:\n    stagehand render proxy-site --domain poll.example.com --email admin@example.com\n\n\
                   Preview the systemd unit:\n    stagehand render unit --domain poll.example.com")]
pub struct RenderArgs {
    /// File to render
    #[arg(value_enum)]
    pub artifact: RenderTarget,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Datastore service unit the application depends on
    #[arg(long, value_name = "UNIT", default_value = DEFAULT_DATASTORE_UNIT)]
    pub datastore_unit: String,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;

    #[test]
    fn test_cli_parsing_render() {
        let cli = Cli::try_parse_from([
            "stagehand",
            "render",
            "renewal-script",
            "--domain",
            "poll.example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.artifact, RenderTarget::RenewalScript);
                assert_eq!(args.datastore_unit, "mongod");
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn test_artifact_names_match_targets() {
        let key = SecretKey::placeholder();
        for target in RenderTarget::value_variants() {
            let name = target.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(target.artifact(false, &key, "mongod").name(), name);
        }
    }
}
