// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One full reconciliation pass across every category.
//!
//! A pass reloads the selection file, lists every source directory, applies
//! each category's plan and persists the pruned intended sets. The selection
//! is only written once every action of the pass has completed, so the
//! persisted intent never runs ahead of the mirror.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::error::{Error, Result};
use crate::fs::MediaFs;
use crate::reconcile::{self, ActionReport, Plan};
use crate::selection::{Fingerprint, SelectionState, SelectionStore};
use crate::snapshot::{mirror_listing, SourceListing};

/// Result of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// No selection file existed; defaults were written and nothing else done.
    Seeded {
        state: SelectionState,
        fingerprint: Fingerprint,
    },
    /// The mirror was reconciled against the selection file.
    Reconciled(PassSummary),
}

impl PassOutcome {
    /// Fingerprint of the selection file as written by this pass.
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            PassOutcome::Seeded { fingerprint, .. } => *fingerprint,
            PassOutcome::Reconciled(summary) => summary.fingerprint,
        }
    }

    /// Selection state as written by this pass.
    pub fn state(&self) -> &SelectionState {
        match self {
            PassOutcome::Seeded { state, .. } => state,
            PassOutcome::Reconciled(summary) => &summary.state,
        }
    }
}

/// What a reconciling pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub state: SelectionState,
    pub reports: BTreeMap<String, ActionReport>,
    pub fingerprint: Fingerprint,
}

impl PassSummary {
    /// Totals across all categories.
    pub fn total(&self) -> ActionReport {
        let mut total = ActionReport::default();
        for report in self.reports.values() {
            total.merge(*report);
        }
        total
    }
}

/// Drives reconciliation passes for one selection store.
pub struct Converger<F> {
    store: SelectionStore,
    fs: F,
    home: PathBuf,
    /// Categories of the last selection that loaded and validated.
    known: Mutex<SelectionState>,
}

impl<F: MediaFs> Converger<F> {
    /// `home` roots the default source directories used when seeding.
    pub fn new(store: SelectionStore, fs: F, home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let known = Mutex::new(SelectionState::seeded(&home));
        Converger {
            store,
            fs,
            home,
            known,
        }
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Runs one full pass.
    ///
    /// Mirror directories of the last known selection are created before the
    /// selection file is read, so they exist even if it fails to parse.
    pub fn run_pass(&self) -> Result<PassOutcome> {
        let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.ensure_mirror_dirs(&known, &self.fs);

        let Some(state) = self.store.load()? else {
            let outcome = self.seed()?;
            *known = outcome.state().clone();
            return Ok(outcome);
        };
        state.validate()?;
        if state != *known {
            self.store.ensure_mirror_dirs(&state, &self.fs);
            *known = state.clone();
        }
        drop(known);

        let sources = SourceListing::refresh(&state, &self.fs)?;
        let (next, reports) = self.reconcile_all(state, &sources)?;
        let (state, fingerprint) = self.persist(next)?;

        let summary = PassSummary {
            state,
            reports,
            fingerprint,
        };
        let total = summary.total();
        tracing::info!(
            "pass complete: {} copied ({} bytes), {} deleted",
            total.copied,
            total.bytes,
            total.deleted
        );
        Ok(PassOutcome::Reconciled(summary))
    }

    fn seed(&self) -> Result<PassOutcome> {
        tracing::info!(
            "selection file {} does not exist, writing defaults",
            self.store.path().display()
        );
        let state = SelectionState::seeded(&self.home);
        self.store.ensure_mirror_dirs(&state, &self.fs);
        let fingerprint = self.store.save(&state)?;
        Ok(PassOutcome::Seeded { state, fingerprint })
    }

    /// Applies every category's plan, one thread per category.
    fn reconcile_all(
        &self,
        mut state: SelectionState,
        sources: &SourceListing,
    ) -> Result<(SelectionState, BTreeMap<String, ActionReport>)> {
        let sync_root = self.store.sync_root();
        let fs: &dyn MediaFs = &self.fs;

        let results: Vec<(String, Result<(Plan, ActionReport)>)> = thread::scope(|scope| {
            let handles: Vec<_> = state
                .iter()
                .map(|(key, dir)| {
                    let source = sources.get(key);
                    let handle = scope.spawn(move || -> Result<(Plan, ActionReport)> {
                        let mirror = mirror_listing(dir, sync_root, fs)?;
                        let plan = Plan::compute(source, &mirror, &dir.synced_files);
                        if plan.is_empty() {
                            tracing::debug!("{} is up to date", dir.name);
                            return Ok((plan, ActionReport::default()));
                        }
                        let report = reconcile::apply(&plan.actions(dir, sync_root), fs)?;
                        Ok((plan, report))
                    });
                    (key.clone(), handle)
                })
                .collect();
            handles
                .into_iter()
                .map(|(key, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(Error::io(
                            sync_root,
                            std::io::Error::other(format!("reconciling {key} panicked")),
                        ))
                    });
                    (key, result)
                })
                .collect()
        });

        let mut reports = BTreeMap::new();
        let mut failures = Vec::new();
        for (key, result) in results {
            match result {
                Ok((plan, report)) => {
                    if let Some(dir) = state.get_mut(&key) {
                        dir.synced_files = plan.next_intended;
                    }
                    reports.insert(key, report);
                }
                Err(Error::Actions(mut failed)) => failures.append(&mut failed),
                Err(e) => return Err(e),
            }
        }
        if !failures.is_empty() {
            return Err(Error::Actions(failures));
        }
        Ok((state, reports))
    }

    /// Prunes intent against a fresh source listing and writes the selection.
    ///
    /// Sources may change while copies run; listing again here keeps names
    /// that disappeared mid-pass from lingering in the selection file.
    fn persist(&self, mut state: SelectionState) -> Result<(SelectionState, Fingerprint)> {
        let sources = SourceListing::refresh(&state, &self.fs)?;
        for (key, dir) in state.categories.iter_mut() {
            let present = sources.get(key);
            dir.synced_files.retain(|name| present.contains(name));
        }
        let fingerprint = self.store.save(&state)?;
        Ok((state, fingerprint))
    }
}

#[cfg(test)]
#[path = "converge_tests.rs"]
mod tests;
