//! ufw packet filter

use super::{Firewall, PackageInstaller};
use crate::error::Result;
use crate::exec::{Executor, Invocation};

#[derive(Debug, Default)]
pub struct Ufw;

impl Firewall for Ufw {
    fn install(&self, exec: &mut Executor, packages: &dyn PackageInstaller) -> Result<()> {
        packages.install(exec, &["ufw"], "Installing UFW firewall")
    }

    fn reset_to_defaults(&self, exec: &mut Executor) -> Result<()> {
        exec.execute(Invocation::new(["ufw", "--force", "reset"]).ignore_errors())?;
        exec.run(&["ufw", "default", "deny", "incoming"])?;
        exec.run(&["ufw", "default", "allow", "outgoing"])?;
        Ok(())
    }

    fn allow(&self, exec: &mut Executor, rule: &str) -> Result<()> {
        exec.run(&["ufw", "allow", rule])?;
        Ok(())
    }

    fn enable(&self, exec: &mut Executor) -> Result<()> {
        exec.execute(Invocation::new(["ufw", "--force", "enable"]).describe("Enabling firewall"))?;
        Ok(())
    }

    fn is_active(&self, exec: &mut Executor) -> Option<bool> {
        let result = exec.probe(&["ufw", "status"]);
        if !result.succeeded {
            return None;
        }
        Some(result.stdout.contains("Status: active"))
    }
}
