//! Version command implementation

use crate::config::{DEFAULT_INSTALL_DIR, SERVICE_NAME};
use crate::context::DEFAULT_LOG_FILE;
use crate::error::Result;

/// Run version command
pub fn run() -> Result<()> {
    println!("stagehand {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("  Profile: {}", build_profile());
    println!();
    println!("Installs:");
    println!("  Service: {SERVICE_NAME}");
    println!("  Default directory: {DEFAULT_INSTALL_DIR}");
    println!("  Default log: {DEFAULT_LOG_FILE}");

    Ok(())
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
