// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Three-way reconciliation of one category.
//!
//! Given the source listing, the mirror listing and the intended set, the
//! plan is built from four set operations, in this order:
//!
//! 1. `unmanaged = mirror - source`: mirror files whose source is gone.
//! 2. `deselected = mirror - intended`: mirror files the user no longer wants.
//! 3. `to_add = (intended & source) - mirror`: wanted files not yet mirrored.
//! 4. `next_intended = intended & source`: stale intent is pruned.
//!
//! Steps 1 and 2 both read the original mirror listing and may overlap.
//! Applying a plan yields `mirror == source & intended`, and planning again
//! against the result yields no actions.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;

use crate::category::MediaDir;
use crate::error::{ActionFailure, Error, Result};
use crate::fs::MediaFs;

/// Set differences computed for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub unmanaged: BTreeSet<String>,
    pub deselected: BTreeSet<String>,
    pub to_add: BTreeSet<String>,
    /// Intended names still present at the source, in the user's order.
    pub next_intended: Vec<String>,
}

impl Plan {
    pub fn compute(
        source: &BTreeSet<String>,
        mirror: &BTreeSet<String>,
        intended: &[String],
    ) -> Self {
        let intended_set: BTreeSet<String> = intended.iter().cloned().collect();
        let unmanaged = mirror.difference(source).cloned().collect();
        let deselected = mirror.difference(&intended_set).cloned().collect();

        let mut seen = BTreeSet::new();
        let next_intended: Vec<String> = intended
            .iter()
            .filter(|name| source.contains(*name) && seen.insert(name.as_str()))
            .cloned()
            .collect();
        // Intended names missing at the source are pruned, never copied.
        let to_add = next_intended
            .iter()
            .filter(|name| !mirror.contains(*name))
            .cloned()
            .collect();
        Plan {
            unmanaged,
            deselected,
            to_add,
            next_intended,
        }
    }

    /// Every name to remove from the mirror, each once.
    pub fn deletions(&self) -> BTreeSet<&str> {
        self.unmanaged
            .iter()
            .chain(&self.deselected)
            .map(String::as_str)
            .collect()
    }

    /// Returns true if the mirror needs no changes.
    pub fn is_empty(&self) -> bool {
        self.unmanaged.is_empty() && self.deselected.is_empty() && self.to_add.is_empty()
    }

    /// Concrete filesystem actions for `dir`, deletions first.
    pub fn actions(&self, dir: &MediaDir, sync_root: &Path) -> Vec<Action> {
        let mirror_dir = dir.mirror_dir(sync_root);
        let deletes = self.deletions().into_iter().map(|name| Action::Delete {
            path: mirror_dir.join(name),
        });
        let copies = self.to_add.iter().map(|name| Action::Copy {
            from: dir.path.join(name),
            to: mirror_dir.join(name),
        });
        deletes.chain(copies).collect()
    }
}

/// A single change to the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Copy { from: PathBuf, to: PathBuf },
    Delete { path: PathBuf },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Copy { from, to } => write!(f, "copy {} -> {}", from.display(), to.display()),
            Action::Delete { path } => write!(f, "delete {}", path.display()),
        }
    }
}

/// Counts of completed actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionReport {
    pub copied: usize,
    pub deleted: usize,
    pub bytes: u64,
}

impl ActionReport {
    pub fn merge(&mut self, other: ActionReport) {
        self.copied += other.copied;
        self.deleted += other.deleted;
        self.bytes += other.bytes;
    }
}

/// Runs `actions` against `fs`.
///
/// Deletions are dispatched together and awaited before copies start, so a
/// copy never races a delete of the same name. Every action runs on its own
/// thread. All failures are collected into [`Error::Actions`].
pub fn apply(actions: &[Action], fs: &dyn MediaFs) -> Result<ActionReport> {
    let (deletes, copies): (Vec<&Action>, Vec<&Action>) = actions
        .iter()
        .partition(|action| matches!(action, Action::Delete { .. }));

    let mut report = ActionReport::default();
    let mut failures = Vec::new();
    for batch in [deletes, copies] {
        for (action, result) in run_batch(&batch, fs) {
            match (action, result) {
                (Action::Delete { path }, Ok(_)) => {
                    tracing::info!("deleted {}", path.display());
                    report.deleted += 1;
                }
                (Action::Copy { to, .. }, Ok(bytes)) => {
                    tracing::info!("copied {} ({bytes} bytes)", to.display());
                    report.copied += 1;
                    report.bytes += bytes;
                }
                (action, Err(e)) => {
                    tracing::error!("{action} failed: {e}");
                    failures.push(ActionFailure {
                        action: action.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(Error::Actions(failures))
    }
}

fn run_batch<'a>(batch: &[&'a Action], fs: &dyn MediaFs) -> Vec<(&'a Action, Result<u64>)> {
    thread::scope(|scope| {
        let handles: Vec<_> = batch
            .iter()
            .map(|&action| (action, scope.spawn(move || run_one(action, fs))))
            .collect();
        handles
            .into_iter()
            .map(|(action, handle)| {
                let result = handle.join().unwrap_or_else(|_| {
                    Err(Error::io(
                        action_target(action),
                        std::io::Error::other("action thread panicked"),
                    ))
                });
                (action, result)
            })
            .collect()
    })
}

fn run_one(action: &Action, fs: &dyn MediaFs) -> Result<u64> {
    match action {
        Action::Copy { from, to } => fs.copy_file(from, to),
        Action::Delete { path } => fs.remove_file(path).map(|()| 0),
    }
}

fn action_target(action: &Action) -> &Path {
    match action {
        Action::Copy { to, .. } => to,
        Action::Delete { path } => path,
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
