//! Host filesystem access for generated files
//!
//! Every file the installer writes or inspects goes through a `Layout`. On a
//! real host the layout is the identity mapping; tests root it in a scratch
//! directory so absolute paths like `/etc/nginx/...` land inside it.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StagehandError};

#[derive(Debug, Clone, Default)]
pub struct Layout {
    root: Option<PathBuf>,
}

impl Layout {
    /// The real filesystem
    pub fn host() -> Self {
        Self { root: None }
    }

    /// Every absolute path is re-rooted under `root`
    #[cfg(test)]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Map a host path into this layout
    pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.root {
            None => path.to_path_buf(),
            Some(root) => {
                let relative: PathBuf = path
                    .components()
                    .filter(|c| matches!(c, Component::Normal(_) | Component::CurDir))
                    .collect();
                root.join(relative)
            }
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.path(path).exists()
    }

    #[cfg(test)]
    pub fn read(&self, path: impl AsRef<Path>) -> Result<String> {
        Ok(fs::read_to_string(self.path(path))?)
    }

    /// Write a file, creating parent directories; `mode` sets unix permissions
    pub fn write(&self, path: impl AsRef<Path>, contents: &str, mode: Option<u32>) -> Result<()> {
        let target = self.path(path);
        let fail = |e: std::io::Error| StagehandError::FileWriteFailed {
            path: target.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(fail)?;
        }
        fs::write(&target, contents).map_err(fail)?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode)).map_err(fail)?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }

    pub fn create_dir_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let target = self.path(path);
        fs::create_dir_all(&target).map_err(|e| StagehandError::FileWriteFailed {
            path: target.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Remove a directory tree; a missing directory is not an error
    pub fn remove_dir_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let target = self.path(path);
        match fs::remove_dir_all(&target) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(StagehandError::FileWriteFailed {
                    path: target.display().to_string(),
                    reason: e.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Point `link` at `target`, replacing whatever `link` was before
    ///
    /// The link text is the host path of `target`, so it stays valid on the
    /// real filesystem.
    #[cfg(unix)]
    pub fn replace_symlink(&self, target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
        let link = self.path(link);
        let fail = |e: std::io::Error| StagehandError::FileWriteFailed {
            path: link.display().to_string(),
            reason: e.to_string(),
        };

        if link.symlink_metadata().is_ok() {
            fs::remove_file(&link).map_err(fail)?;
        }
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent).map_err(fail)?;
        }
        std::os::unix::fs::symlink(target.as_ref(), &link).map_err(fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_host_layout_is_identity() {
        let layout = Layout::host();
        assert_eq!(layout.path("/etc/nginx"), PathBuf::from("/etc/nginx"));
    }

    #[test]
    fn test_rooted_layout_reroots_absolute_paths() {
        let layout = Layout::rooted("/tmp/sandbox");
        assert_eq!(
            layout.path("/etc/systemd/system/secret-poll.service"),
            PathBuf::from("/tmp/sandbox/etc/systemd/system/secret-poll.service")
        );
        // Parent components cannot escape the root
        assert_eq!(
            layout.path("/etc/../../outside"),
            PathBuf::from("/tmp/sandbox/etc/outside")
        );
    }

    #[test]
    fn test_write_creates_parents_and_sets_mode() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::rooted(temp.path());

        layout
            .write("/opt/secret-poll/status.sh", "#!/bin/bash\n", Some(0o755))
            .unwrap();
        assert_eq!(
            layout.read("/opt/secret-poll/status.sh").unwrap(),
            "#!/bin/bash\n"
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(layout.path("/opt/secret-poll/status.sh"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_symlink() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::rooted(temp.path());
        let link = "/etc/nginx/sites-enabled/secret-poll";

        layout.write(link, "stale", None).unwrap();
        layout
            .replace_symlink("/etc/nginx/sites-available/secret-poll", link)
            .unwrap();

        let target = fs::read_link(layout.path(link)).unwrap();
        assert_eq!(
            target,
            PathBuf::from("/etc/nginx/sites-available/secret-poll")
        );
    }
}
