// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon settings resolved from the command line, the environment and
//! the user's home directory, in that order of precedence.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::env;
use crate::error::{Error, Result};

/// Sync root relative to the home directory.
const DEFAULT_SYNC_ROOT: &str = "Dropbox/Apps/Poormans";
/// State directory relative to the home directory.
const DEFAULT_STATE_DIR: &str = ".local/state/poormans";

/// Mirror selected media files into a synced folder.
#[derive(Debug, Parser)]
#[command(name = "poormansd", version)]
pub struct Args {
    /// Directory the mirror is written to (default: ~/Dropbox/Apps/Poormans)
    #[arg(long, value_name = "DIR")]
    pub sync_root: Option<PathBuf>,

    /// Selection file (default: <sync-root>/config.json)
    #[arg(long, value_name = "PATH")]
    pub selection_file: Option<PathBuf>,

    /// Directory for the lock and PID files
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Run a single reconciliation pass and exit
    #[arg(long)]
    pub once: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Quiet period after a selection file change before reconciling
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub settle_ms: u64,
}

/// Environment values that influence settings.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub sync_root: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub xdg_state_home: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        EnvOverrides {
            sync_root: env::sync_root(),
            state_dir: env::state_dir(),
            xdg_state_home: env::xdg_state_home(),
        }
    }
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub home: PathBuf,
    pub sync_root: PathBuf,
    pub selection_file: PathBuf,
    pub state_dir: PathBuf,
    pub once: bool,
    pub log_file: Option<PathBuf>,
    pub settle: Duration,
}

impl Settings {
    pub fn resolve(args: Args, env: EnvOverrides, home: Option<PathBuf>) -> Result<Self> {
        let home = home.ok_or(Error::NoHome)?;

        let sync_root = args
            .sync_root
            .or(env.sync_root)
            .unwrap_or_else(|| home.join(DEFAULT_SYNC_ROOT));
        let selection_file = args
            .selection_file
            .unwrap_or_else(|| sync_root.join(pm_core::SELECTION_FILE_NAME));
        let state_dir = args
            .state_dir
            .or(env.state_dir)
            .or_else(|| env.xdg_state_home.map(|dir| dir.join("poormans")))
            .unwrap_or_else(|| home.join(DEFAULT_STATE_DIR));

        Ok(Settings {
            home,
            sync_root,
            selection_file,
            state_dir,
            once: args.once,
            log_file: args.log_file,
            settle: Duration::from_millis(args.settle_ms),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
