//! Step 1: privilege and host requirements

use std::path::Path;

use super::StepEnv;
use crate::context::Logger;
use crate::error::{Result, StagehandError};
use crate::sequencer::StepStatus;
use crate::system::OsFamily;
use crate::system::host::{as_gib, gib};

/// Free space required on the root filesystem
pub const MIN_DISK_GIB: u64 = 2;

/// Available memory below which a warning is logged
pub const LOW_MEMORY_GIB: u64 = 1;

pub fn run(env: &mut StepEnv) -> Result<StepStatus> {
    if !env.host.is_privileged() {
        env.error("This installer must be run as root");
        env.info("Please run: sudo stagehand install");
        return Err(StagehandError::PrivilegeRequired);
    }
    env.success("Running with root privileges");

    match env.host.os_release().map(|text| OsFamily::from_os_release(&text)) {
        Some(family) if family.is_supported() => env.success("Supported OS detected"),
        Some(_) => env.warn("This OS may not be fully supported, continuing anyway"),
        None => env.warn("Cannot determine OS, continuing anyway"),
    }

    let available = env.host.available_disk_bytes(Path::new("/"))?;
    if available < gib(MIN_DISK_GIB) {
        let error = StagehandError::InsufficientDiskSpace {
            available_gb: as_gib(available),
            required_gb: MIN_DISK_GIB,
        };
        env.error(&error.to_string());
        return Err(error);
    }
    env.success(&format!("Disk space: {:.1}GB available", as_gib(available)));

    match env.host.available_memory_bytes() {
        Some(memory) if memory < gib(LOW_MEMORY_GIB) => {
            env.warn(&format!(
                "Low memory: {:.1}GB available; the frontend build may be slow",
                as_gib(memory)
            ));
        }
        Some(memory) => env.success(&format!("Memory: {:.1}GB available", as_gib(memory))),
        None => env.warn("Cannot determine available memory"),
    }

    env.success("System requirements check completed");
    Ok(StepStatus::Completed)
}
