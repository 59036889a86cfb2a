// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote side of asset synchronization
//!
//! Fetches the asset manifest (name → hash → variant URLs) and raw variant
//! bytes. Neither operation retries; retry policy lives in the sync
//! coordinator.

mod error;
mod http;
mod manifest;

pub use error::FetchError;
pub use http::HttpAssetClient;
pub use manifest::{parse_manifest, AssetFetcher, ManifestClient};
