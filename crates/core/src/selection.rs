// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The user-editable selection file.
//!
//! The selection file is a JSON object keyed by category:
//!
//! ```json
//! { "musicDir": { "path": "/home/me/Music", "name": "Music", "syncedFiles": ["a.mp3"] } }
//! ```
//!
//! It doubles as configuration (source paths, display names) and as the only
//! durable record of intent (`syncedFiles`). Editing `syncedFiles` by hand is
//! how the user adds files to or removes files from the mirror.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::category::{default_categories, MediaDir};
use crate::error::{Error, Result};
use crate::fs::MediaFs;

/// File name of the selection file inside the sync root.
pub const SELECTION_FILE_NAME: &str = "config.json";

/// Category key to category entry, in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    pub categories: BTreeMap<String, MediaDir>,
}

impl SelectionState {
    /// The built-in categories rooted at `home`, with nothing selected.
    pub fn seeded(home: &Path) -> Self {
        SelectionState {
            categories: default_categories(home).into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MediaDir> {
        self.categories.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut MediaDir> {
        self.categories.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MediaDir)> {
        self.categories.iter()
    }

    /// Validates every category entry.
    ///
    /// Display names must be unique: two categories sharing a mirror
    /// directory would delete each other's files on every pass.
    pub fn validate(&self) -> Result<()> {
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (key, dir) in self.iter() {
            dir.validate()?;
            if let Some(other) = owners.insert(dir.name.as_str(), key.as_str()) {
                return Err(Error::InvalidSelection(format!(
                    "categories '{other}' and '{key}' share the mirror directory '{}'",
                    dir.name
                )));
            }
        }
        Ok(())
    }
}

/// Size and modification time of the selection file.
///
/// Used to tell the daemon's own writes apart from user edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl Fingerprint {
    /// Fingerprint of the file at `path`, or `None` if it cannot be read.
    pub fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Fingerprint {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Loads and saves the selection file of one sync root.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    sync_root: PathBuf,
    path: PathBuf,
}

impl SelectionStore {
    /// Store whose selection file lives at `<sync_root>/config.json`.
    pub fn new(sync_root: impl Into<PathBuf>) -> Self {
        let sync_root = sync_root.into();
        let path = sync_root.join(SELECTION_FILE_NAME);
        SelectionStore { sync_root, path }
    }

    /// Store with an explicit selection file location.
    pub fn with_path(sync_root: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        SelectionStore {
            sync_root: sync_root.into(),
            path: path.into(),
        }
    }

    pub fn sync_root(&self) -> &Path {
        &self.sync_root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the selection file. Returns `Ok(None)` if it does not exist.
    pub fn load(&self) -> Result<Option<SelectionState>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        let state = serde_json::from_str(&content).map_err(|source| Error::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(state))
    }

    /// Rewrites the whole selection file.
    ///
    /// Content goes to a temp file in the same directory which is synced and
    /// then renamed over the selection file, so readers never observe a
    /// partial write. The temp file is removed if any step fails.
    pub fn save(&self, state: &SelectionState) -> Result<Fingerprint> {
        let mut content = serde_json::to_vec_pretty(state).map_err(|source| Error::Json {
            path: self.path.clone(),
            source,
        })?;
        content.push(b'\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let temp_name = format!(
            ".{}.{}.tmp",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            std::process::id()
        );
        let temp_path = self.path.with_file_name(temp_name);

        let result = write_synced(&temp_path, &content)
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::io(&self.path, e));
        }

        tracing::debug!("wrote selection file {}", self.path.display());
        Fingerprint::of(&self.path).ok_or_else(|| {
            Error::io(
                &self.path,
                std::io::Error::new(ErrorKind::NotFound, "selection file vanished after write"),
            )
        })
    }

    /// Current fingerprint of the selection file, if it exists.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        Fingerprint::of(&self.path)
    }

    /// Creates the sync root and every category's mirror directory.
    ///
    /// A category whose directory cannot be created is skipped with a warning
    /// so one bad entry does not block the others.
    pub fn ensure_mirror_dirs(&self, state: &SelectionState, fs: &dyn MediaFs) {
        if let Err(e) = fs.create_dir(&self.sync_root) {
            tracing::warn!("{e}");
        }
        for (key, dir) in state.iter() {
            if let Err(e) = fs.create_dir(&dir.mirror_dir(&self.sync_root)) {
                tracing::warn!("mirror directory for {key} not created: {e}");
            }
        }
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
