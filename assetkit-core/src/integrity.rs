// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Variant integrity verification using SHA-256 checksums
//!
//! Manifest variants may carry a checksum. Downloaded bytes are verified
//! against it before they are handed to the store.

use ring::digest::{digest, SHA256};
use thiserror::Error;

/// Verify SHA-256 checksum of a payload
///
/// # Arguments
/// * `data` - The bytes to verify
/// * `expected` - Expected checksum in format "sha256:hexstring"
///
/// # Example
/// ```
/// use assetkit_core::integrity::{compute_checksum, verify_checksum};
///
/// let data = b"<svg/>";
/// let checksum = compute_checksum(data);
/// assert!(verify_checksum(data, &checksum).is_ok());
/// ```
pub fn verify_checksum(data: &[u8], expected: &str) -> Result<(), IntegrityError> {
    let expected_hex = expected
        .strip_prefix("sha256:")
        .ok_or(IntegrityError::InvalidFormat)?;

    let actual_hex = hex::encode(digest(&SHA256, data).as_ref());

    if actual_hex.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(IntegrityError::ChecksumMismatch {
            expected: expected_hex.to_string(),
            actual: actual_hex,
        })
    }
}

/// Compute SHA-256 checksum of a payload
///
/// Returns a checksum string in format "sha256:hexstring".
pub fn compute_checksum(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(digest(&SHA256, data).as_ref()))
}

/// Errors that can occur during integrity verification
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// Checksum format is invalid (missing "sha256:" prefix)
    #[error("Invalid checksum format, expected 'sha256:...'")]
    InvalidFormat,

    /// Computed checksum doesn't match expected checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Expected checksum (hex string without prefix)
        expected: String,
        /// Actual computed checksum (hex string without prefix)
        actual: String,
    },
}
