//! Copying application sources into the install directory

use std::fs;
use std::path::Path;

/// Entries never copied out of a source tree
#[derive(Default, Clone)]
pub struct CopyOptions {
    pub exclude: Vec<String>,
}

impl CopyOptions {
    /// Skip VCS metadata, dependency caches and stale build output
    pub fn application_sources() -> Self {
        Self {
            exclude: ["node_modules", "venv", "__pycache__", ".git"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Copy a directory recursively, overwriting files that already exist
pub fn copy_dir_recursive<P1, P2>(src: P1, dst: P2, options: &CopyOptions) -> std::io::Result<u64>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let src_ref = src.as_ref();
    let dst_ref = dst.as_ref();
    let mut copied = 0;

    fs::create_dir_all(dst_ref)?;

    for entry in fs::read_dir(src_ref)? {
        let entry = entry?;
        let entry_path = entry.path();
        let file_name = entry.file_name();

        if options
            .exclude
            .iter()
            .any(|excluded| file_name.to_str() == Some(excluded.as_str()))
        {
            continue;
        }

        let dst_path = dst_ref.join(&file_name);

        if entry_path.is_dir() {
            copied += copy_dir_recursive(&entry_path, &dst_path, options)?;
        } else {
            fs::copy(&entry_path, &dst_path)?;
            copied += 1;
        }
    }

    Ok(copied)
}
