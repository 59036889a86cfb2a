// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Store error types.

use std::io;

use thiserror::Error;

/// Errors that can occur with the asset store
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Name or hash is empty
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Asset has no variant payloads
    #[error("Asset {0} has no variants")]
    EmptyAsset(String),

    /// Refusing to evict because the replacement is not durable
    #[error("Hash {hash} of {name} is not committed")]
    NotCommitted {
        /// Asset name
        name: String,
        /// Hash that was expected to be kept
        hash: String,
    },

    /// Invalid time value
    #[error("Invalid time value")]
    InvalidTime,
}
