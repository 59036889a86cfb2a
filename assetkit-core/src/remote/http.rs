// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP manifest client and asset fetcher
//!
//! This module provides reqwest-based fetching with:
//! - Per-request timeouts
//! - Size limits
//! - Proxy support

#[cfg(feature = "http")]
use async_trait::async_trait;
#[cfg(feature = "http")]
use reqwest::Client;
#[cfg(feature = "http")]
use tracing::debug;

use super::error::FetchError;
#[cfg(feature = "http")]
use super::manifest::{parse_manifest, AssetFetcher, ManifestClient};
use crate::config::AssetConfig;
#[cfg(feature = "http")]
use crate::types::ManifestEntry;

/// Fetches the manifest and asset bytes over HTTP
#[cfg(feature = "http")]
#[derive(Clone)]
pub struct HttpAssetClient {
    client: Client,
    manifest_url: String,
    max_asset_size: u64,
}

#[cfg(feature = "http")]
impl HttpAssetClient {
    /// Create a new HTTP client from config
    pub fn new(config: &AssetConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!(
                "AssetKit/{}",
                option_env!("CARGO_PKG_VERSION").unwrap_or("0.1.0")
            ));

        // Only the configured proxy is used, never one from the environment
        builder = match &config.proxy_url {
            Some(proxy_url) => builder.proxy(reqwest::Proxy::all(proxy_url)?),
            None => builder.no_proxy(),
        };

        Ok(Self {
            client: builder.build()?,
            manifest_url: config.manifest_url.clone(),
            max_asset_size: config.max_asset_size,
        })
    }

    /// Get the manifest URL
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// GET `url`, reading the body chunk by chunk and stopping as soon as it
    /// exceeds `max_asset_size`.
    async fn get_limited(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        // Check content length before downloading
        if let Some(len) = response.content_length() {
            if len > self.max_asset_size {
                return Err(FetchError::TooLarge {
                    size: len,
                    max: self.max_asset_size,
                });
            }
        }

        // Content-Length may be missing or wrong
        let capacity = response.content_length().unwrap_or(0).min(self.max_asset_size);
        let mut data = Vec::with_capacity(capacity as usize);
        while let Some(chunk) = response.chunk().await? {
            let received = (data.len() + chunk.len()) as u64;
            if received > self.max_asset_size {
                return Err(FetchError::TooLarge {
                    size: received,
                    max: self.max_asset_size,
                });
            }
            data.extend_from_slice(&chunk);
        }

        Ok(data)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ManifestClient for HttpAssetClient {
    async fn fetch_manifest(&self) -> Result<Vec<ManifestEntry>, FetchError> {
        debug!(url = %self.manifest_url, "Fetching asset manifest");
        let body = self.get_limited(&self.manifest_url).await?;
        parse_manifest(&body, &self.manifest_url)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl AssetFetcher for HttpAssetClient {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "Downloading asset variant");
        self.get_limited(url).await
    }
}

/// Stub client when the http feature is not enabled
#[cfg(not(feature = "http"))]
pub struct HttpAssetClient {
    _private: (),
}

#[cfg(not(feature = "http"))]
impl HttpAssetClient {
    /// Create a new HTTP client (stub - always fails)
    pub fn new(_config: &AssetConfig) -> Result<Self, FetchError> {
        Err(FetchError::FeatureDisabled)
    }
}
