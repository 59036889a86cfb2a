// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration for asset synchronization

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the asset sync and image cache system
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Local storage path (an `assets/` directory is created beneath it)
    pub storage_path: PathBuf,

    /// Remote manifest URL
    pub manifest_url: String,

    /// Enable/disable remote updates
    pub remote_updates_enabled: bool,

    /// Minimum interval between scheduled syncs
    pub check_interval: Duration,

    /// HTTP timeout, applied per request
    pub timeout: Duration,

    /// Maximum size of a single variant (bytes)
    pub max_asset_size: u64,

    /// Parallel downloads allowed against the asset host
    pub max_concurrent_downloads: usize,

    /// Attempts per variant download for retryable failures
    pub max_attempts: u32,

    /// Delay before the first retry, doubled for each further attempt
    pub retry_backoff: Duration,

    /// Maximum number of decoded images kept in memory
    pub memory_cache_entries: usize,

    /// Maximum total size of decoded images kept in memory (bytes)
    pub memory_cache_bytes: usize,

    /// Remove stored assets whose name disappeared from the manifest
    pub prune_removed: bool,

    /// Proxy URL (SOCKS5 or HTTP)
    pub proxy_url: Option<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("."),
            manifest_url: "https://assets.example.com/manifest.json".to_string(),
            remote_updates_enabled: true,
            check_interval: Duration::from_secs(3600), // 1 hour
            timeout: Duration::from_secs(30),
            max_asset_size: 5 * 1024 * 1024, // 5 MB
            max_concurrent_downloads: 4,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(250),
            memory_cache_entries: 64,
            memory_cache_bytes: 32 * 1024 * 1024, // 32 MB
            prune_removed: true,
            proxy_url: None,
        }
    }
}

impl AssetConfig {
    /// Create a config for the given storage path and manifest URL
    pub fn new(storage_path: impl Into<PathBuf>, manifest_url: impl Into<String>) -> Self {
        Self {
            storage_path: storage_path.into(),
            manifest_url: manifest_url.into(),
            ..Default::default()
        }
    }

    /// Configure with custom proxy
    ///
    /// Proxied connections get a longer timeout to absorb the extra hop.
    pub fn with_proxy(mut self, proxy_url: String) -> Self {
        self.proxy_url = Some(proxy_url);
        self.timeout = self.timeout.max(Duration::from_secs(60));
        self
    }

    /// Set the number of parallel downloads (at least one)
    pub fn with_max_concurrent_downloads(mut self, n: usize) -> Self {
        self.max_concurrent_downloads = n.max(1);
        self
    }

    /// Set the retry policy for individual downloads
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_backoff = backoff;
        self
    }

    /// Set the in-memory image cache bounds
    pub fn with_memory_cache(mut self, entries: usize, bytes: usize) -> Self {
        self.memory_cache_entries = entries.max(1);
        self.memory_cache_bytes = bytes;
        self
    }

    /// Disable remote updates (serve only what is already stored)
    pub fn without_remote_updates(mut self) -> Self {
        self.remote_updates_enabled = false;
        self
    }

    pub(crate) fn download_slots(&self) -> usize {
        self.max_concurrent_downloads.max(1)
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}
