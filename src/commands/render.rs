//! Render command implementation
//!
//! Prints one generated file for a configuration without touching the host.
//! The backend secret is replaced by a placeholder.

use crate::cli::RenderArgs;
use crate::error::{Result, StagehandError};
use crate::generate::{self, SecretKey};

/// Run render command
pub fn run(args: RenderArgs) -> Result<()> {
    print!("{}", render(&args)?);
    Ok(())
}

fn render(args: &RenderArgs) -> Result<String> {
    let config = args
        .config
        .answers()?
        .to_builder()
        .ok_or_else(|| StagehandError::ConfigInvalid {
            message: "--domain (or an answers file with a domain) is required".to_string(),
        })?
        .build()?;

    let secret_key = SecretKey::placeholder();
    let artifact = args
        .artifact
        .artifact(config.enable_ssl(), &secret_key, &args.datastore_unit);

    generate::generate(&artifact, &config).ok_or_else(|| StagehandError::ConfigInvalid {
        message: format!(
            "{} does not apply to a {} deployment",
            artifact.name(),
            config.web_server()
        ),
    })
}
