// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Selection file watcher driving reconciliation passes.
//!
//! The supervisor alternates between two states:
//!
//! ```text
//! Idle (watching) --user edit--> Reconciling (suspended) --pass done--> Idle
//! ```
//!
//! While reconciling, the watcher callback drops events, and any events that
//! slipped into the channel are drained once the pass completes. Events are
//! never queued across a pass; because passes are idempotent, the next edit
//! picks up anything that was missed.
//!
//! The daemon's own selection file write is recognized by its fingerprint
//! (size and mtime), so it never triggers another pass.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use pm_core::{Fingerprint, PassOutcome};

use crate::error::{Error, Result};

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Reconciling,
}

/// What the supervisor did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The event did not concern the selection file.
    Unrelated,
    /// The selection file is exactly as the last pass wrote it.
    OwnWrite,
    /// A pass ran.
    Reconciled,
}

type EventResult = notify::Result<Event>;

pub struct Supervisor {
    selection_path: PathBuf,
    events: Receiver<EventResult>,
    suspended: Arc<AtomicBool>,
    state: WatchState,
    last_written: Option<Fingerprint>,
    settle: Duration,
    _watcher: Option<RecommendedWatcher>,
}

impl Supervisor {
    /// Starts watching the directory containing `selection_path`.
    ///
    /// The selection file is replaced by rename on every write, so its parent
    /// directory is watched and events are filtered by path. The supervisor
    /// starts suspended; [`Supervisor::reconcile`] resumes it.
    pub fn start(selection_path: &Path, settle: Duration) -> Result<Self> {
        let selection_path = canonical_target(selection_path)?;
        let (tx, rx) = mpsc::channel();
        let suspended = Arc::new(AtomicBool::new(true));

        let flag = Arc::clone(&suspended);
        let mut watcher = notify::recommended_watcher(move |event: EventResult| {
            if !flag.load(Ordering::SeqCst) {
                let _ = tx.send(event);
            }
        })?;
        if let Some(parent) = selection_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }
        tracing::info!("watching {}", selection_path.display());

        let mut supervisor = Supervisor::from_channel(selection_path, rx, suspended, settle);
        supervisor._watcher = Some(watcher);
        Ok(supervisor)
    }

    /// Supervisor fed from an existing event channel.
    pub fn from_channel(
        selection_path: PathBuf,
        events: Receiver<EventResult>,
        suspended: Arc<AtomicBool>,
        settle: Duration,
    ) -> Self {
        Supervisor {
            selection_path,
            events,
            suspended,
            state: WatchState::Idle,
            last_written: None,
            settle,
            _watcher: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Blocks, running `pass` for every external edit of the selection file.
    ///
    /// Returns when a pass fails or the event source goes away.
    pub fn run<P>(&mut self, mut pass: P) -> Result<()>
    where
        P: FnMut() -> pm_core::Result<PassOutcome>,
    {
        loop {
            let event = self.events.recv().map_err(|_| Error::WatchClosed)?;
            self.handle(event, &mut pass)?;
        }
    }

    /// Processes one watcher event.
    pub fn handle<P>(&mut self, event: EventResult, pass: &mut P) -> Result<Handled>
    where
        P: FnMut() -> pm_core::Result<PassOutcome>,
    {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("watch error: {e}");
                return Ok(Handled::Unrelated);
            }
        };
        if !self.concerns_selection(&event) {
            return Ok(Handled::Unrelated);
        }

        let current = Fingerprint::of(&self.selection_path);
        if current.is_some() && current == self.last_written {
            tracing::trace!("ignoring own write of {}", self.selection_path.display());
            return Ok(Handled::OwnWrite);
        }

        tracing::info!(
            "changes detected at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.reconcile(pass)?;
        Ok(Handled::Reconciled)
    }

    /// Suspends watching, runs one pass, then resumes.
    pub fn reconcile<P>(&mut self, pass: &mut P) -> Result<()>
    where
        P: FnMut() -> pm_core::Result<PassOutcome>,
    {
        self.suspend();
        if !self.settle.is_zero() {
            // Let editors finish writing before the file is read.
            thread::sleep(self.settle);
        }

        let outcome = pass()?;
        self.last_written = Some(outcome.fingerprint());
        self.resume();
        Ok(())
    }

    fn suspend(&mut self) {
        self.state = WatchState::Reconciling;
        self.suspended.store(true, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        let dropped = self.events.try_iter().count();
        if dropped > 0 {
            tracing::debug!("dropped {dropped} event(s) received during the pass");
        }
        self.suspended.store(false, Ordering::SeqCst);
        self.state = WatchState::Idle;
    }

    fn concerns_selection(&self, event: &Event) -> bool {
        let relevant_kind = matches!(
            event.kind,
            EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        );
        relevant_kind && event.paths.iter().any(|p| *p == self.selection_path)
    }
}

/// Absolute selection file path with a canonical parent, matching the form
/// of paths reported by the watcher.
fn canonical_target(path: &Path) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let parent = parent
        .canonicalize()
        .map_err(|e| Error::io(&parent, e))?;
    match path.file_name() {
        Some(name) => Ok(parent.join(name)),
        None => Err(Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
        )),
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
