// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem primitives used by the reconciler.
//!
//! Directory listing, byte copy, removal and directory creation sit behind
//! the [`MediaFs`] trait so passes can run against the real filesystem
//! ([`LocalFs`]) or against a fake that injects failures.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Platform housekeeping files that are never mirrored.
pub const EXCLUDED_NAMES: &[&str] = &["$RECYCLE.BIN", ".DS_Store", ".localized"];

/// Permissions of created mirror directories (before the umask applies).
#[cfg(unix)]
pub const MIRROR_DIR_MODE: u32 = 0o770;

/// Returns true if `name` is on the fixed exclusion list.
pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_NAMES.contains(&name)
}

/// The filesystem operations a reconciliation pass depends on.
pub trait MediaFs: Send + Sync {
    /// Lists the names of regular files directly inside `dir`.
    ///
    /// Excluded names are never returned.
    fn list_names(&self, dir: &Path) -> Result<BTreeSet<String>>;

    /// Copies `from` to `to`, replacing any existing file. Returns the
    /// number of bytes copied.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64>;

    /// Removes a file. A file that is already gone is not an error.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Creates a directory, and any missing parents, if it does not exist yet.
    fn create_dir(&self, dir: &Path) -> Result<()>;
}

/// [`MediaFs`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl MediaFs for LocalFs {
    fn list_names(&self, dir: &Path) -> Result<BTreeSet<String>> {
        let list_err = |source| Error::ListDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut names = BTreeSet::new();
        for entry in fs::read_dir(dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            // Follows symlinks so a linked file counts as a file.
            let is_file = fs::metadata(entry.path())
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if is_excluded(&name) => {}
                Ok(name) => {
                    names.insert(name);
                }
                Err(raw) => {
                    tracing::warn!("skipping non-UTF-8 file name {:?} in {}", raw, dir.display());
                }
            }
        }
        Ok(names)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        let copy_err = |source| Error::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        };

        let temp_path = temp_sibling(to);
        let result = stream_copy(from, &temp_path).and_then(|bytes| {
            fs::rename(&temp_path, to)?;
            Ok(bytes)
        });
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result.map_err(copy_err)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn create_dir(&self, dir: &Path) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(MIRROR_DIR_MODE);
        }
        match builder.create(dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
            Err(e) => Err(Error::io(dir, e)),
        }
    }
}

/// Hidden temporary path next to `target`, on the same filesystem.
fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.poormans.tmp"))
}

fn stream_copy(from: &Path, to: &Path) -> io::Result<u64> {
    let mut reader = File::open(from)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(to)?;
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.sync_all()?;
    Ok(bytes)
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
