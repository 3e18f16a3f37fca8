// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Failure-injecting [`MediaFs`] for tests.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::fs::{LocalFs, MediaFs};

/// Delegates to [`LocalFs`] except for the paths it was told to fail on.
#[derive(Debug, Default)]
pub struct FlakyFs {
    fail_copy_names: BTreeSet<String>,
    fail_remove_names: BTreeSet<String>,
    fail_list_dirs: BTreeSet<PathBuf>,
    vanish_after_copy: BTreeSet<String>,
    copies: Mutex<Vec<PathBuf>>,
}

impl FlakyFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_copy_of(mut self, name: &str) -> Self {
        self.fail_copy_names.insert(name.to_string());
        self
    }

    pub fn fail_remove_of(mut self, name: &str) -> Self {
        self.fail_remove_names.insert(name.to_string());
        self
    }

    /// Deletes the source of `name` right after it has been copied, as if
    /// the user removed it while the pass was running.
    pub fn vanish_after_copy(mut self, name: &str) -> Self {
        self.vanish_after_copy.insert(name.to_string());
        self
    }

    pub fn fail_list_of(mut self, dir: &Path) -> Self {
        self.fail_list_dirs.insert(dir.to_path_buf());
        self
    }

    /// Destinations of every attempted copy, in completion order.
    pub fn copies(&self) -> Vec<PathBuf> {
        self.copies.lock().unwrap().clone()
    }
}

impl MediaFs for FlakyFs {
    fn list_names(&self, dir: &Path) -> Result<BTreeSet<String>> {
        if self.fail_list_dirs.contains(dir) {
            return Err(Error::ListDir {
                path: dir.to_path_buf(),
                source: std::io::Error::other("injected listing failure"),
            });
        }
        LocalFs.list_names(dir)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copies.lock().unwrap().push(to.to_path_buf());
        let name = file_name(to);
        if self.fail_copy_names.contains(&name) {
            return Err(Error::Copy {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source: std::io::Error::other("injected copy failure"),
            });
        }
        let bytes = LocalFs.copy_file(from, to)?;
        if self.vanish_after_copy.contains(&name) {
            std::fs::remove_file(from).unwrap();
        }
        Ok(bytes)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        if self.fail_remove_names.contains(&file_name(path)) {
            return Err(Error::Remove {
                path: path.to_path_buf(),
                source: std::io::Error::other("injected remove failure"),
            });
        }
        LocalFs.remove_file(path)
    }

    fn create_dir(&self, dir: &Path) -> Result<()> {
        LocalFs.create_dir(dir)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
