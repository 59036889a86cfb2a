// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fetch error types.

use thiserror::Error;

use crate::integrity::IntegrityError;

/// Errors that can occur while fetching the manifest or asset bytes
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP error with status code
    #[error("HTTP error: {0}")]
    Http(u16),

    /// Network/request error from the HTTP client
    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),

    /// Network failure reported by a non-HTTP transport
    #[error("Network error: {0}")]
    Network(String),

    /// Manifest body is not valid manifest JSON
    #[error("Manifest parse error: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// Variant URL cannot be resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Payload too large
    #[error("Content too large: {size} bytes (max {max})")]
    TooLarge {
        /// Actual size in bytes
        size: u64,
        /// Maximum allowed size in bytes
        max: u64,
    },

    /// Integrity verification failed
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// HTTP support is not compiled in
    #[error("HTTP asset fetching is not enabled")]
    FeatureDisabled,
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(status) => *status >= 500 || *status == 408 || *status == 429,
            #[cfg(feature = "http")]
            FetchError::Request(e) => !e.is_builder() && !e.is_redirect(),
            FetchError::Network(_) => true,
            _ => false,
        }
    }

    /// Whether the manifest itself was malformed (as opposed to unreachable).
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            FetchError::ManifestParse(_) | FetchError::InvalidUrl(_)
        )
    }
}
