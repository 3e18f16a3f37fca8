// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Errors that stop the daemon.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] pm_core::Error),

    #[error("file watch failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("cannot determine home directory\n  hint: set HOME so default media directories can be found")]
    NoHome,

    #[error("another poormansd is already running (lock held on {path})")]
    AlreadyRunning { path: PathBuf },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("selection file event channel closed")]
    WatchClosed,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
