// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync cycle outcomes.

use thiserror::Error;

use crate::remote::FetchError;

/// An asset that could not be updated during a sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub name: String,
    /// Manifest hash that was being fetched
    pub hash: String,
    pub error: String,
    /// Whether a later cycle may succeed without a manifest change
    pub retryable: bool,
}

/// Aggregate result of one sync cycle
///
/// Per-asset failures never fail the cycle; they are listed here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Names whose new hash was downloaded and committed
    pub updated: Vec<String>,
    /// Entries already stored at the manifest hash
    pub unchanged: usize,
    /// Entries whose download or commit failed
    pub failures: Vec<AssetFailure>,
    /// Updated entries whose superseded versions could not be removed
    ///
    /// The new version is committed and served; the next cycle retries the
    /// eviction.
    pub eviction_failures: Vec<AssetFailure>,
    /// Entries not attempted because the cycle was cancelled
    pub skipped: usize,
    /// Stored names removed because the manifest no longer lists them
    pub pruned: Vec<String>,
    /// Cycle stopped early at a cancellation checkpoint
    pub cancelled: bool,
}

impl SyncReport {
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether every manifest entry is now stored at its manifest hash only
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
            && self.eviction_failures.is_empty()
            && self.skipped == 0
            && !self.cancelled
    }

    /// Names whose stored version changed (updated or pruned)
    pub fn changed_names(&self) -> impl Iterator<Item = &str> {
        self.updated
            .iter()
            .chain(self.pruned.iter())
            .map(String::as_str)
    }
}

/// Errors that abort a whole sync cycle
///
/// Cloneable so that coalesced callers can share one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Manifest could not be fetched
    #[error("Manifest fetch failed: {0}")]
    Network(String),

    /// Manifest was fetched but is malformed
    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    /// Remote updates are disabled by configuration
    #[error("Remote updates are disabled")]
    Disabled,

    /// The cycle that this call joined was dropped before finishing
    #[error("Sync aborted before completion")]
    Aborted,
}

impl From<FetchError> for SyncError {
    fn from(err: FetchError) -> Self {
        if err.is_parse_error() {
            SyncError::ManifestParse(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}
