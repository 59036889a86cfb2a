// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Asset Service - the entry point applications talk to
//!
//! Wires the store, the sync coordinator and the image cache together:
//! - `update_all_assets` mirrors the remote manifest into the store
//! - `load_asset` serves the best stored variant, decoding at most once per
//!   key and never returning an image from a superseded hash

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AssetConfig;
use crate::coordinator::{SyncCoordinator, SyncError, SyncReport};
use crate::decoder::ImageDecoder;
use crate::image_cache::{ImageCache, ImageCacheStats};
use crate::remote::{AssetFetcher, FetchError, ManifestClient};
use crate::resolver::{Resolution, VariantResolver};
use crate::store::{AssetStore, StoreError};
use crate::types::{AssetType, CacheKey, DecodedImage, LoadedAsset, UiMode};

/// Errors raised while constructing the service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Remote client error: {0}")]
    Fetch(#[from] FetchError),
}

/// Asset synchronization plus decoded image cache
pub struct AssetService {
    coordinator: SyncCoordinator,
    store: Arc<AssetStore>,
    cache: ImageCache,
    decoder: Arc<dyn ImageDecoder>,
}

impl AssetService {
    /// Create a service over injected remote clients and decoder
    pub fn new(
        config: AssetConfig,
        manifest_client: Arc<dyn ManifestClient>,
        fetcher: Arc<dyn AssetFetcher>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Self, ServiceError> {
        let store = Arc::new(AssetStore::open(&config.storage_path)?);
        let cache = ImageCache::new(config.memory_cache_entries, config.memory_cache_bytes);
        let coordinator = SyncCoordinator::new(config, manifest_client, fetcher, Arc::clone(&store));

        Ok(Self {
            coordinator,
            store,
            cache,
            decoder,
        })
    }

    /// Create a service that talks HTTP to `config.manifest_url`
    #[cfg(feature = "http")]
    pub fn with_http(
        config: AssetConfig,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Self, ServiceError> {
        let client = Arc::new(crate::remote::HttpAssetClient::new(&config)?);
        Self::new(config, client.clone(), client, decoder)
    }

    /// Synchronize the store with the remote manifest
    ///
    /// Concurrent calls share one cycle. Cached images of every name whose
    /// stored version changed are dropped before this returns.
    pub async fn update_all_assets(&self) -> Result<SyncReport, SyncError> {
        let report = self.coordinator.update_all_assets().await?;
        for name in report.changed_names() {
            let dropped = self.cache.invalidate_name(name);
            if dropped > 0 {
                debug!(name = %name, dropped, "Cached images invalidated");
            }
        }
        Ok(report)
    }

    /// Run a sync only when the check interval has elapsed
    ///
    /// Returns `Ok(None)` when no sync was due.
    pub async fn update_if_due(&self) -> Result<Option<SyncReport>, SyncError> {
        if !self.coordinator.should_sync_now() {
            return Ok(None);
        }
        self.update_all_assets().await.map(Some)
    }

    /// Whether a scheduled sync is due
    pub fn should_sync_now(&self) -> bool {
        self.coordinator.should_sync_now()
    }

    /// Whether a sync cycle is running
    pub fn is_syncing(&self) -> bool {
        self.coordinator.is_syncing()
    }

    /// Request cancellation of the running sync; false when idle
    pub fn cancel_sync(&self) -> bool {
        self.coordinator.cancel()
    }

    /// Load the best stored variant of `name` for `(asset_type, ui_mode)`
    ///
    /// Returns `None` when nothing usable is stored, or when reading or
    /// decoding fails; callers show their own placeholder.
    pub async fn load_asset(
        &self,
        name: &str,
        asset_type: AssetType,
        ui_mode: UiMode,
    ) -> Option<LoadedAsset> {
        let Some(resolution) = VariantResolver::resolve_in(&self.store, name, asset_type, ui_mode)
        else {
            debug!(name = %name, %asset_type, mode = ui_mode.as_str(), "No stored variant");
            return None;
        };

        let key = CacheKey::new(name, resolution.variant);
        if let Some(image) = self.cache.get_bitmap_for(&key, &resolution.hash) {
            return Some(loaded(resolution, image));
        }

        let _guard = self.cache.decode_lock(&key).await;
        // Filled while we waited for the lock
        if let Some(image) = self.cache.get_bitmap_for(&key, &resolution.hash) {
            return Some(loaded(resolution, image));
        }

        let image = match self.decode(&resolution).await {
            Ok(Some(image)) => Arc::new(image),
            Ok(None) => {
                debug!(name = %name, hash = %resolution.hash, "Variant vanished before read");
                return None;
            }
            Err(e) => {
                warn!(
                    name = %name,
                    hash = %resolution.hash,
                    variant = %resolution.variant,
                    error = %e,
                    "Failed to load asset"
                );
                return None;
            }
        };

        self.cache.put_bitmap(key, &resolution.hash, Arc::clone(&image));
        Some(loaded(resolution, image))
    }

    async fn decode(
        &self,
        resolution: &Resolution,
    ) -> Result<Option<DecodedImage>, LoadError> {
        let store = Arc::clone(&self.store);
        let decoder = Arc::clone(&self.decoder);
        let resolution = resolution.clone();

        tokio::task::spawn_blocking(move || -> Result<Option<DecodedImage>, LoadError> {
            let Some(data) =
                store.read_variant(&resolution.name, &resolution.hash, resolution.variant)?
            else {
                return Ok(None);
            };
            let image = decoder
                .decode(resolution.variant.asset_type, &data)
                .map_err(|e| LoadError::Decode(e.to_string()))?;
            Ok(Some(image))
        })
        .await
        .map_err(|e| LoadError::Decode(e.to_string()))?
    }

    /// Image cache counters
    pub fn cache_stats(&self) -> ImageCacheStats {
        self.cache.stats()
    }

    /// Drop every decoded image; stored bytes are untouched
    pub fn clear_memory_cache(&self) {
        self.cache.clear();
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<AssetStore> {
        &self.store
    }

    pub fn config(&self) -> &AssetConfig {
        self.coordinator.config()
    }
}

#[derive(Debug, Error)]
enum LoadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Decode failed: {0}")]
    Decode(String),
}

fn loaded(resolution: Resolution, image: Arc<DecodedImage>) -> LoadedAsset {
    LoadedAsset {
        name: resolution.name,
        hash: resolution.hash,
        variant: resolution.variant,
        image,
    }
}
