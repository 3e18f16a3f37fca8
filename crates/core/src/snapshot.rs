// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time listings of source and mirror directories.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::thread;

use crate::category::MediaDir;
use crate::error::{Error, Result};
use crate::fs::MediaFs;
use crate::selection::SelectionState;

/// Names currently present in each category's source directory.
///
/// Recomputed on every pass and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceListing {
    files: BTreeMap<String, BTreeSet<String>>,
}

impl SourceListing {
    /// Lists every category's source directory, one thread per category.
    ///
    /// Any listing failure fails the whole refresh.
    pub fn refresh(state: &SelectionState, fs: &dyn MediaFs) -> Result<Self> {
        let results: Vec<(String, Result<BTreeSet<String>>)> = thread::scope(|scope| {
            let handles: Vec<_> = state
                .iter()
                .map(|(key, dir)| {
                    let handle = scope.spawn(move || fs.list_names(&dir.path));
                    (key.clone(), dir, handle)
                })
                .collect();
            handles
                .into_iter()
                .map(|(key, dir, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(Error::ListDir {
                            path: dir.path.clone(),
                            source: std::io::Error::other("listing thread panicked"),
                        })
                    });
                    (key, result)
                })
                .collect()
        });

        let mut files = BTreeMap::new();
        for (key, result) in results {
            files.insert(key, result?);
        }
        Ok(SourceListing { files })
    }

    /// Source names of a category; empty if the category was not listed.
    pub fn get(&self, key: &str) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.files.get(key).unwrap_or(&EMPTY)
    }

    pub fn insert(&mut self, key: impl Into<String>, names: BTreeSet<String>) {
        self.files.insert(key.into(), names);
    }
}

/// Names currently present in a category's mirror directory.
pub fn mirror_listing(
    dir: &MediaDir,
    sync_root: &Path,
    fs: &dyn MediaFs,
) -> Result<BTreeSet<String>> {
    fs.list_names(&dir.mirror_dir(sync_root))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
