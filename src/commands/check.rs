//! Check command implementation
//!
//! Assesses the host without changing it. Exits non-zero when any issue
//! would stop an installation; warnings alone still pass.

use crate::cli::CheckArgs;
use crate::context::RunContext;
use crate::error::{Result, StagehandError};
use crate::exec::{Executor, SystemRunner};
use crate::readiness::Assessor;
use crate::system::SystemHost;
use crate::system::ufw::Ufw;
use crate::ui;
use crate::verify::{LiveNetwork, ProbeOptions};

/// Run check command
pub fn run(args: CheckArgs) -> Result<()> {
    let ctx = if args.json {
        RunContext::detached().quiet()
    } else {
        RunContext::detached()
    };
    let mut exec = Executor::new(Box::new(SystemRunner::default()), ctx);

    let report = Assessor {
        exec: &mut exec,
        host: &SystemHost,
        network: &LiveNetwork,
        firewall: &Ufw,
        source_dir: args.source_dir,
        offline: args.offline,
        timeout: ProbeOptions::default().timeout,
    }
    .assess();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ui::report::print_readiness(&report);
    }

    match report.issues() {
        0 => Ok(()),
        issues => Err(StagehandError::NotReady { issues }),
    }
}
