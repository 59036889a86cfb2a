// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! AssetKit Mobile Bindings
//!
//! UniFFI bindings for Android and iOS platforms.
//! Exposes a blocking, mobile-friendly API on top of assetkit-core.
//!
//! Note: every call blocks the calling thread on an internal runtime, so
//! platforms should invoke sync and load methods off the main thread.
//! `cancel_sync` may be called from any thread while a sync is running.

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use assetkit_core::{AssetService, ImageDecoder, SignatureDecoder};

// === Modules ===

mod decoder;
mod error;
mod types;

// Re-export public types
pub use decoder::{MobileDecodedImage, PlatformDecoderAdapter, PlatformImageDecoder};
pub use error::MobileError;
pub use types::{
    MobileAssetConfig, MobileAssetFailure, MobileAssetType, MobileCacheStats, MobileLoadedAsset,
    MobileSyncReport, MobileUiMode,
};

uniffi::setup_scaffolding!();

// === Logging ===

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install a tracing subscriber writing to stderr.
///
/// `filter` uses `RUST_LOG` syntax (e.g. "assetkit_core=debug"). Only the
/// first call has an effect; returns whether this call installed it.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    let mut installed = false;
    LOGGING.get_or_init(|| {
        let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("assetkit_core=info"));
        installed = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init()
            .is_ok();
    });
    installed
}

// === Main Interface ===

/// Main AssetKit interface for mobile platforms.
#[derive(uniffi::Object)]
pub struct MobileAssetService {
    runtime: Runtime,
    service: AssetService,
    last_report: Mutex<Option<MobileSyncReport>>,
}

impl MobileAssetService {
    fn build(
        data_dir: String,
        config: MobileAssetConfig,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Arc<Self>, MobileError> {
        if data_dir.is_empty() {
            return Err(MobileError::InvalidInput("data_dir is empty".to_string()));
        }
        let data_path = PathBuf::from(&data_dir);

        std::fs::create_dir_all(&data_path)
            .map_err(|e| MobileError::StorageError(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("assetkit-sync")
            .enable_all()
            .build()
            .map_err(|e| MobileError::Internal(e.to_string()))?;

        let service = AssetService::with_http(config.to_core_config(data_path), decoder)?;

        info!(data_dir = %data_dir, "Mobile asset service ready");
        Ok(Arc::new(MobileAssetService {
            runtime,
            service,
            last_report: Mutex::new(None),
        }))
    }
}

#[uniffi::export]
impl MobileAssetService {
    /// Create a service that passes validated bytes through to the platform.
    #[uniffi::constructor]
    pub fn new(data_dir: String, config: MobileAssetConfig) -> Result<Arc<Self>, MobileError> {
        Self::build(data_dir, config, Arc::new(SignatureDecoder))
    }

    /// Create a service that decodes through a platform implementation.
    #[uniffi::constructor]
    pub fn new_with_decoder(
        data_dir: String,
        config: MobileAssetConfig,
        decoder: Box<dyn PlatformImageDecoder>,
    ) -> Result<Arc<Self>, MobileError> {
        let adapter = PlatformDecoderAdapter::new(Arc::from(decoder));
        Self::build(data_dir, config, Arc::new(adapter))
    }

    /// Synchronize all assets with the remote manifest (blocking).
    pub fn update_all_assets(&self) -> Result<MobileSyncReport, MobileError> {
        let report: MobileSyncReport = self
            .runtime
            .block_on(self.service.update_all_assets())
            .map_err(|e| {
                warn!(error = %e, "Asset sync failed");
                MobileError::from(e)
            })?
            .into();
        *self.last_report.lock() = Some(report.clone());
        Ok(report)
    }

    /// Sync only if the check interval has elapsed; None when not due.
    pub fn update_if_due(&self) -> Result<Option<MobileSyncReport>, MobileError> {
        if !self.service.should_sync_now() {
            return Ok(None);
        }
        self.update_all_assets().map(Some)
    }

    /// Whether a scheduled sync is due.
    pub fn should_sync_now(&self) -> bool {
        self.service.should_sync_now()
    }

    /// Whether a sync is running.
    pub fn is_syncing(&self) -> bool {
        self.service.is_syncing()
    }

    /// Request cancellation of the running sync; false when idle.
    pub fn cancel_sync(&self) -> bool {
        self.service.cancel_sync()
    }

    /// Report of the last sync run through this instance.
    pub fn last_sync_report(&self) -> Option<MobileSyncReport> {
        self.last_report.lock().clone()
    }

    /// Load the best stored variant of an asset (blocking).
    ///
    /// Returns None when nothing usable is stored; show a placeholder.
    pub fn load_asset(
        &self,
        name: String,
        asset_type: MobileAssetType,
        ui_mode: MobileUiMode,
    ) -> Option<MobileLoadedAsset> {
        self.runtime
            .block_on(
                self.service
                    .load_asset(&name, asset_type.into(), ui_mode.into()),
            )
            .map(Into::into)
    }

    /// Names with a committed version in local storage.
    pub fn stored_asset_names(&self) -> Vec<String> {
        self.service.store().names()
    }

    /// Image cache counters.
    pub fn cache_stats(&self) -> MobileCacheStats {
        self.service.cache_stats().into()
    }

    /// Drop decoded images (e.g. on memory pressure); stored files are kept.
    pub fn clear_memory_cache(&self) {
        self.service.clear_memory_cache();
    }
}
