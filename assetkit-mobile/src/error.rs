// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mobile-friendly error types.

use assetkit_core::{ServiceError, SyncError};

/// Mobile-friendly error type.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MobileError {
    #[error("Remote updates are disabled")]
    UpdatesDisabled,

    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SyncError> for MobileError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Disabled => MobileError::UpdatesDisabled,
            SyncError::Network(msg) => MobileError::NetworkError(msg),
            SyncError::ManifestParse(msg) => MobileError::ManifestError(msg),
            SyncError::Aborted => MobileError::SyncFailed("aborted before completion".to_string()),
        }
    }
}

impl From<ServiceError> for MobileError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => MobileError::StorageError(e.to_string()),
            ServiceError::Fetch(e) => MobileError::NetworkError(e.to_string()),
        }
    }
}
