// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Media categories mirrored by the daemon.
//!
//! Each category pairs a source directory with a display name. The mirror of
//! a category lives at `<sync_root>/<name>` and is flat: only files directly
//! inside the source directory are ever mirrored.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Key of the documents category in the selection file.
pub const DOCUMENTS: &str = "documentsDir";
/// Key of the movies category in the selection file.
pub const MOVIES: &str = "moviesDir";
/// Key of the music category in the selection file.
pub const MUSIC: &str = "musicDir";
/// Key of the pictures category in the selection file.
pub const PICTURES: &str = "picturesDir";

/// One category entry of the selection file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDir {
    /// Source directory whose files may be mirrored.
    pub path: PathBuf,
    /// Display name, also the mirror sub-directory name.
    pub name: String,
    /// File names the user wants mirrored, in the order the user listed them.
    #[serde(default)]
    pub synced_files: Vec<String>,
}

impl MediaDir {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        MediaDir {
            path: path.into(),
            name: name.into(),
            synced_files: Vec::new(),
        }
    }

    /// Mirror directory of this category under `sync_root`.
    pub fn mirror_dir(&self, sync_root: &Path) -> PathBuf {
        sync_root.join(&self.name)
    }

    /// Checks that the display name is a single plain path component.
    pub fn validate(&self) -> Result<()> {
        let mut components = Path::new(&self.name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(Error::InvalidSelection(format!(
                "category name '{}' must be a single directory name",
                self.name
            ))),
        }
    }
}

/// The four built-in categories, rooted at `home`, with nothing selected.
pub fn default_categories(home: &Path) -> Vec<(String, MediaDir)> {
    [
        (DOCUMENTS, "Documents"),
        (MOVIES, "Movies"),
        (MUSIC, "Music"),
        (PICTURES, "Pictures"),
    ]
    .into_iter()
    .map(|(key, name)| (key.to_string(), MediaDir::new(home.join(name), name)))
    .collect()
}

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
