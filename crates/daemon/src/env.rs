// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`names`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

/// Returns the value of `POORMANS_SYNC_ROOT` if set and non-empty.
pub fn sync_root() -> Option<PathBuf> {
    non_empty_path(names::POORMANS_SYNC_ROOT)
}

/// Returns the value of `POORMANS_STATE_DIR` if set and non-empty.
pub fn state_dir() -> Option<PathBuf> {
    non_empty_path(names::POORMANS_STATE_DIR)
}

/// Returns the value of `XDG_STATE_HOME` if set and non-empty.
pub fn xdg_state_home() -> Option<PathBuf> {
    non_empty_path(names::XDG_STATE_HOME)
}

fn non_empty_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
