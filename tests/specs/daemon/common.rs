// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Not every spec file uses every helper.
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub const CATEGORIES: [&str; 4] = ["Documents", "Movies", "Music", "Pictures"];

/// `poormansd` with a scrubbed environment and `HOME` pointing at `home`.
pub fn poormansd(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("poormansd").unwrap();
    cmd.env("HOME", home)
        .env_remove("POORMANS_SYNC_ROOT")
        .env_remove("POORMANS_STATE_DIR")
        .env("RUST_LOG", "warn");
    cmd
}

/// Creates the four default source directories under `<temp>/home`.
pub fn make_home(temp: &TempDir) -> PathBuf {
    let home = temp.path().join("home");
    for name in CATEGORIES {
        fs::create_dir_all(home.join(name)).unwrap();
    }
    home
}
