//! apt-get package installer

use super::PackageInstaller;
use crate::error::Result;
use crate::exec::{Executor, Invocation};

#[derive(Debug, Default)]
pub struct Apt;

impl PackageInstaller for Apt {
    fn refresh(&self, exec: &mut Executor) -> Result<()> {
        exec.execute(Invocation::new(["apt-get", "update"]).describe("Updating package list"))?;
        Ok(())
    }

    fn install(&self, exec: &mut Executor, packages: &[&str], description: &str) -> Result<()> {
        let argv = ["apt-get", "install", "-y"]
            .into_iter()
            .chain(packages.iter().copied());
        exec.execute(Invocation::new(argv).describe(description))?;
        Ok(())
    }

    fn tidy(&self, exec: &mut Executor) {
        for argv in [&["apt-get", "clean"][..], &["apt-get", "autoremove", "-y"][..]] {
            // Only fails for an empty argv
            let _ = exec.execute(Invocation::new(argv.iter().copied()).ignore_errors());
        }
    }
}
