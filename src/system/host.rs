//! Host facts: privilege, disk, memory, operating system, name resolution

use std::net::{IpAddr, ToSocketAddrs};
use std::path::Path;

use crate::error::{Result, StagehandError};

const GIB: u64 = 1024 * 1024 * 1024;

/// Bytes to gibibytes, for display
#[allow(clippy::cast_precision_loss)]
pub fn as_gib(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

pub fn gib(n: u64) -> u64 {
    n * GIB
}

/// Linux distribution family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Ubuntu,
    Debian,
    RedHat,
    Other,
}

impl OsFamily {
    /// Classify the contents of `/etc/os-release`
    pub fn from_os_release(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("ubuntu") {
            OsFamily::Ubuntu
        } else if text.contains("debian") {
            OsFamily::Debian
        } else if ["centos", "rhel", "fedora", "rocky", "almalinux"]
            .iter()
            .any(|name| text.contains(name))
        {
            OsFamily::RedHat
        } else {
            OsFamily::Other
        }
    }

    pub fn is_supported(self) -> bool {
        matches!(self, OsFamily::Ubuntu | OsFamily::Debian)
    }
}

/// Read-only facts about the machine being provisioned
pub trait HostProbe {
    fn is_privileged(&self) -> bool;

    /// Free bytes available to unprivileged users on the filesystem holding `path`
    fn available_disk_bytes(&self, path: &Path) -> Result<u64>;

    /// `MemAvailable` in bytes
    fn available_memory_bytes(&self) -> Option<u64>;

    /// `MemTotal` in bytes
    fn total_memory_bytes(&self) -> Option<u64>;

    /// Raw contents of `/etc/os-release`
    fn os_release(&self) -> Option<String>;

    /// First address `domain` resolves to
    fn resolve(&self, domain: &str) -> Option<IpAddr>;
}

/// Facts read from the running system
#[derive(Debug, Default)]
pub struct SystemHost;

impl HostProbe for SystemHost {
    fn is_privileged(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    #[allow(clippy::cast_lossless, clippy::unnecessary_cast)]
    fn available_disk_bytes(&self, path: &Path) -> Result<u64> {
        let stat = nix::sys::statvfs::statvfs(path).map_err(|e| {
            StagehandError::HostProbeFailed {
                reason: format!("statvfs {}: {e}", path.display()),
            }
        })?;
        Ok(stat.blocks_available() as u64 * stat.fragment_size() as u64)
    }

    fn available_memory_bytes(&self) -> Option<u64> {
        meminfo_bytes(&std::fs::read_to_string("/proc/meminfo").ok()?, "MemAvailable")
    }

    fn total_memory_bytes(&self) -> Option<u64> {
        meminfo_bytes(&std::fs::read_to_string("/proc/meminfo").ok()?, "MemTotal")
    }

    fn os_release(&self) -> Option<String> {
        std::fs::read_to_string("/etc/os-release").ok()
    }

    fn resolve(&self, domain: &str) -> Option<IpAddr> {
        (domain, 80)
            .to_socket_addrs()
            .ok()?
            .next()
            .map(|addr| addr.ip())
    }
}

/// Extract a `/proc/meminfo` field (reported in kB) as bytes
pub fn meminfo_bytes(meminfo: &str, key: &str) -> Option<u64> {
    meminfo.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.strip_prefix(':')?;
        let kb: u64 = rest.split_whitespace().next()?.parse().ok()?;
        Some(kb * 1024)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:        2048000 kB\nMemFree:          100000 kB\nMemAvailable:     512000 kB\n";

    #[test]
    fn test_meminfo_parsing() {
        assert_eq!(meminfo_bytes(MEMINFO, "MemTotal"), Some(2_048_000 * 1024));
        assert_eq!(meminfo_bytes(MEMINFO, "MemAvailable"), Some(512_000 * 1024));
        assert_eq!(meminfo_bytes(MEMINFO, "SwapTotal"), None);
        // Prefix of another key must not match
        assert_eq!(meminfo_bytes(MEMINFO, "Mem"), None);
    }

    #[test]
    fn test_os_family() {
        let ubuntu = "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nID=ubuntu\nID_LIKE=debian\n";
        assert_eq!(OsFamily::from_os_release(ubuntu), OsFamily::Ubuntu);
        assert_eq!(
            OsFamily::from_os_release("ID=debian\n"),
            OsFamily::Debian
        );
        assert_eq!(
            OsFamily::from_os_release("ID=\"rocky\"\nID_LIKE=\"rhel centos fedora\"\n"),
            OsFamily::RedHat
        );
        assert_eq!(OsFamily::from_os_release("ID=arch\n"), OsFamily::Other);
        assert!(OsFamily::Debian.is_supported());
        assert!(!OsFamily::RedHat.is_supported());
    }

    #[test]
    fn test_gib_conversion() {
        assert_eq!(gib(2), 2_147_483_648);
        assert!((as_gib(gib(3)) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_system_disk_probe() {
        let bytes = SystemHost.available_disk_bytes(Path::new("/")).unwrap();
        assert!(bytes > 0);
    }
}
