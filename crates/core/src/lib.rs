// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pm-core: Mirror reconciliation for the poormans daemon
//!
//! This crate provides the selection file, directory listings, the
//! three-way reconciler and the convergence pass used by `poormansd`.

pub mod category;
pub mod converge;
pub mod error;
pub mod fs;
pub mod reconcile;
pub mod selection;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod test_fs;

pub use category::{default_categories, MediaDir};
pub use converge::{Converger, PassOutcome, PassSummary};
pub use error::{ActionFailure, Error, Result};
pub use fs::{LocalFs, MediaFs, EXCLUDED_NAMES};
pub use reconcile::{Action, ActionReport, Plan};
pub use selection::{Fingerprint, SelectionState, SelectionStore, SELECTION_FILE_NAME};
pub use snapshot::SourceListing;
