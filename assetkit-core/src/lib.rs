// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! AssetKit Core Library
//!
//! Keeps a local, durable mirror of remotely managed UI assets (logos,
//! banners, icons) and serves them to the UI through a decoded image cache.
//!
//! - The store commits each asset version atomically and never exposes a
//!   partially written one.
//! - Sync cycles download only what the manifest changed and keep the old
//!   version until the new one is durable.
//! - Lookups fall back across types and UI modes when the exact variant is
//!   missing.
//!
//! ```no_run
//! use std::sync::Arc;
//! use assetkit_core::{AssetConfig, AssetService, AssetType, SignatureDecoder, UiMode};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AssetConfig::new("/data/app", "https://cdn.example.com/assets/manifest.json");
//! let service = AssetService::with_http(config, Arc::new(SignatureDecoder))?;
//!
//! let report = service.update_all_assets().await?;
//! println!("{} updated, {} failed", report.updated_count(), report.failed_count());
//!
//! if let Some(logo) = service.load_asset("logo", AssetType::Svg, UiMode::Dark).await {
//!     println!("serving {} from {}", logo.variant, logo.hash);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod decoder;
pub mod image_cache;
pub mod integrity;
pub mod remote;
pub mod resolver;
pub mod service;
pub mod store;
pub mod types;

pub use config::AssetConfig;
pub use coordinator::{AssetFailure, SyncCoordinator, SyncError, SyncReport};
pub use decoder::{DecodeError, ImageDecoder, SignatureDecoder};
pub use image_cache::{ImageCache, ImageCacheStats};
pub use integrity::{compute_checksum, verify_checksum, IntegrityError};
pub use remote::{parse_manifest, AssetFetcher, FetchError, HttpAssetClient, ManifestClient};
pub use resolver::{Resolution, VariantResolver};
pub use service::{AssetService, ServiceError};
pub use store::{AssetStore, StoreError, StoredAsset};
pub use types::{
    Asset, AssetType, CacheKey, DecodedImage, LoadedAsset, ManifestEntry, ManifestVariant, UiMode,
    VariantKey,
};
