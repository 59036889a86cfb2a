// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mobile-friendly types for UniFFI bindings.

use std::path::PathBuf;
use std::time::Duration;

use assetkit_core::{
    AssetConfig, AssetFailure, AssetType, ImageCacheStats, LoadedAsset, SyncReport, UiMode,
};

/// Image format of an asset variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MobileAssetType {
    Svg,
    Jpg,
    Webp,
}

impl From<MobileAssetType> for AssetType {
    fn from(t: MobileAssetType) -> Self {
        match t {
            MobileAssetType::Svg => AssetType::Svg,
            MobileAssetType::Jpg => AssetType::Jpg,
            MobileAssetType::Webp => AssetType::Webp,
        }
    }
}

impl From<AssetType> for MobileAssetType {
    fn from(t: AssetType) -> Self {
        match t {
            AssetType::Svg => MobileAssetType::Svg,
            AssetType::Jpg => MobileAssetType::Jpg,
            AssetType::Webp => MobileAssetType::Webp,
        }
    }
}

/// UI appearance an asset variant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MobileUiMode {
    Light,
    Dark,
}

impl From<MobileUiMode> for UiMode {
    fn from(m: MobileUiMode) -> Self {
        match m {
            MobileUiMode::Light => UiMode::Light,
            MobileUiMode::Dark => UiMode::Dark,
        }
    }
}

impl From<UiMode> for MobileUiMode {
    fn from(m: UiMode) -> Self {
        match m {
            UiMode::Light => MobileUiMode::Light,
            UiMode::Dark => MobileUiMode::Dark,
        }
    }
}

/// Configuration for asset synchronization.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileAssetConfig {
    /// Manifest location
    pub manifest_url: String,
    /// Whether remote updates are enabled
    pub remote_updates_enabled: bool,
    /// Minimum seconds between scheduled syncs
    pub check_interval_secs: u64,
    /// Parallel downloads per sync
    pub max_concurrent_downloads: u32,
    /// Decoded images kept in memory
    pub memory_cache_entries: u32,
    /// Decoded bytes kept in memory, in megabytes
    pub memory_cache_mb: u32,
    /// Optional SOCKS5 proxy URL (e.g., for Tor)
    pub proxy_url: Option<String>,
}

impl Default for MobileAssetConfig {
    fn default() -> Self {
        let core = AssetConfig::default();
        Self {
            manifest_url: core.manifest_url,
            remote_updates_enabled: core.remote_updates_enabled,
            check_interval_secs: core.check_interval.as_secs(),
            max_concurrent_downloads: core.max_concurrent_downloads as u32,
            memory_cache_entries: core.memory_cache_entries as u32,
            memory_cache_mb: (core.memory_cache_bytes / (1024 * 1024)) as u32,
            proxy_url: None,
        }
    }
}

impl MobileAssetConfig {
    pub fn to_core_config(&self, storage_path: PathBuf) -> AssetConfig {
        let mut config = AssetConfig::new(storage_path, self.manifest_url.clone())
            .with_max_concurrent_downloads(self.max_concurrent_downloads as usize)
            .with_memory_cache(
                self.memory_cache_entries as usize,
                (self.memory_cache_mb as usize).saturating_mul(1024 * 1024),
            );
        config.remote_updates_enabled = self.remote_updates_enabled;
        config.check_interval = Duration::from_secs(self.check_interval_secs);

        // Increase timeout for Tor
        if let Some(proxy_url) = &self.proxy_url {
            config = config.with_proxy(proxy_url.clone());
        }

        config
    }
}

/// An asset that failed to update.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileAssetFailure {
    pub name: String,
    pub hash: String,
    pub error: String,
    /// Whether the next sync may succeed without a manifest change
    pub retryable: bool,
}

impl From<AssetFailure> for MobileAssetFailure {
    fn from(f: AssetFailure) -> Self {
        Self {
            name: f.name,
            hash: f.hash,
            error: f.error,
            retryable: f.retryable,
        }
    }
}

/// Outcome of a sync cycle.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileSyncReport {
    pub updated: Vec<String>,
    pub unchanged: u32,
    pub failures: Vec<MobileAssetFailure>,
    /// Updated assets whose old versions are still on disk
    pub eviction_failures: Vec<MobileAssetFailure>,
    pub skipped: u32,
    pub pruned: Vec<String>,
    pub cancelled: bool,
}

impl From<SyncReport> for MobileSyncReport {
    fn from(r: SyncReport) -> Self {
        Self {
            updated: r.updated,
            unchanged: r.unchanged as u32,
            failures: r.failures.into_iter().map(Into::into).collect(),
            eviction_failures: r.eviction_failures.into_iter().map(Into::into).collect(),
            skipped: r.skipped as u32,
            pruned: r.pruned,
            cancelled: r.cancelled,
        }
    }
}

/// A render-ready asset variant.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileLoadedAsset {
    pub name: String,
    pub hash: String,
    /// Type actually served (may differ from the one requested)
    pub asset_type: MobileAssetType,
    /// Mode actually served (may differ from the one requested)
    pub ui_mode: MobileUiMode,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub data: Vec<u8>,
}

impl From<LoadedAsset> for MobileLoadedAsset {
    fn from(a: LoadedAsset) -> Self {
        Self {
            name: a.name,
            hash: a.hash,
            asset_type: a.variant.asset_type.into(),
            ui_mode: a.variant.ui_mode.into(),
            width: a.image.width,
            height: a.image.height,
            data: a.image.pixels.to_vec(),
        }
    }
}

/// Image cache counters.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: u32,
    pub bytes: u64,
    pub hit_rate: f64,
}

impl From<ImageCacheStats> for MobileCacheStats {
    fn from(s: ImageCacheStats) -> Self {
        Self {
            hits: s.hits,
            misses: s.misses,
            evictions: s.evictions,
            entries: s.entries as u32,
            bytes: s.bytes as u64,
            hit_rate: s.hit_rate(),
        }
    }
}
