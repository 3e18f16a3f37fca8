// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! poormansd - The poormans mirror daemon.
//!
//! Keeps `<sync-root>/<Category>/` equal to the files the user selected in
//! `<sync-root>/config.json`, re-reconciling whenever that file is edited.
//!
//! Usage:
//!   poormansd [--sync-root <dir>] [--once]

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use pm_core::{Converger, LocalFs, PassOutcome, SelectionStore};

mod config;
mod env;
mod error;
mod watch;

use config::{Args, EnvOverrides, Settings};
use error::{Error, Result};
use watch::Supervisor;

/// PID filename within the state directory.
const PID_NAME: &str = "daemon.pid";
/// Lock filename for single instance guarantee.
const LOCK_NAME: &str = "daemon.lock";

fn main() -> ExitCode {
    let args = Args::parse();
    let log_file = args.log_file.clone();
    setup_logging(log_file.as_deref());

    match Settings::resolve(args, EnvOverrides::from_env(), dirs::home_dir()).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: Settings) -> Result<()> {
    tracing::info!(
        "poormansd starting, sync_root={}",
        settings.sync_root.display()
    );

    let store = SelectionStore::with_path(&settings.sync_root, &settings.selection_file);
    let converger = Converger::new(store, LocalFs, &settings.home);

    if settings.once {
        let outcome = converger.run_pass()?;
        log_directories(&outcome);
        return Ok(());
    }

    fs::create_dir_all(&settings.state_dir).map_err(|e| Error::io(&settings.state_dir, e))?;
    let lock_path = settings.state_dir.join(LOCK_NAME);
    let lock_file = acquire_lock(&lock_path)?;
    let pid_path = settings.state_dir.join(PID_NAME);
    write_pid_file(&pid_path)?;

    let result = supervise(&converger, &settings);

    cleanup(&pid_path);
    drop(lock_file);
    tracing::info!("poormansd stopped");
    result
}

fn supervise(converger: &Converger<LocalFs>, settings: &Settings) -> Result<()> {
    if let Some(parent) = settings.selection_file.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let mut supervisor = Supervisor::start(&settings.selection_file, settings.settle)?;

    let mut first = true;
    let mut pass = || -> pm_core::Result<PassOutcome> {
        let outcome = converger.run_pass()?;
        if std::mem::take(&mut first) {
            log_directories(&outcome);
        }
        Ok(outcome)
    };

    tracing::info!("syncing media into {}", settings.sync_root.display());
    supervisor.reconcile(&mut pass)?;
    supervisor.run(pass)
}

fn log_directories(outcome: &PassOutcome) {
    for (_, dir) in outcome.state().iter() {
        tracing::info!("{} -> {}", dir.name, dir.path.display());
    }
}

fn setup_logging(log_path: Option<&Path>) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Try to open log file, fall back to stderr
    let file = log_path.and_then(|path| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn acquire_lock(lock_path: &Path) -> Result<fs::File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)
        .map_err(|e| Error::io(lock_path, e))?;
    file.try_lock_exclusive()
        .map_err(|_| Error::AlreadyRunning {
            path: lock_path.to_path_buf(),
        })?;
    Ok(file)
}

fn write_pid_file(pid_path: &Path) -> Result<()> {
    fs::write(pid_path, format!("{}", std::process::id())).map_err(|e| Error::io(pid_path, e))
}

fn cleanup(pid_path: &Path) {
    let _ = fs::remove_file(pid_path);
}
