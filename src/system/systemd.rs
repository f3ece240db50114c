//! systemd service manager

use super::{ServiceAction, ServiceManager};
use crate::error::Result;
use crate::exec::{CommandResult, Executor, Invocation};

#[derive(Debug, Default)]
pub struct Systemd;

impl ServiceManager for Systemd {
    fn control(
        &self,
        exec: &mut Executor,
        action: ServiceAction,
        unit: &str,
        tolerate_failure: bool,
    ) -> Result<CommandResult> {
        let mut invocation = Invocation::new(["systemctl", action.as_str(), unit]);
        if tolerate_failure {
            invocation = invocation.ignore_errors();
        }
        exec.execute(invocation)
    }

    fn is_active(&self, exec: &mut Executor, unit: &str) -> bool {
        exec.probe(&["systemctl", "is-active", unit])
            .stdout_trimmed()
            == "active"
    }

    fn has_unit(&self, exec: &mut Executor, unit: &str) -> bool {
        let listing = exec.probe(&["systemctl", "list-unit-files", "--no-legend"]);
        let wanted = format!("{unit}.service");
        listing
            .stdout
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .any(|name| name == wanted)
    }

    fn reload_units(&self, exec: &mut Executor) -> Result<()> {
        exec.run(&["systemctl", "daemon-reload"])?;
        Ok(())
    }
}
