// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Manifest parsing and the remote collaborator traits.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use super::error::FetchError;
use crate::types::{ManifestEntry, ManifestVariant};

/// Source of the remote asset manifest.
///
/// Implementations perform a single fetch; retry policy belongs to the caller.
#[async_trait]
pub trait ManifestClient: Send + Sync {
    /// Fetch and parse the current manifest.
    async fn fetch_manifest(&self) -> Result<Vec<ManifestEntry>, FetchError>;
}

/// Downloads raw variant bytes.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// GET the given absolute URL and return the body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Envelope form of the manifest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEnvelope {
    #[serde(default)]
    #[allow(dead_code)]
    schema_version: Option<u32>,
    #[serde(default)]
    base_url: Option<String>,
    assets: Vec<ManifestEntry>,
}

/// Parse a manifest body.
///
/// Accepts either a bare JSON array of entries or an envelope object with an
/// `assets` array and an optional `baseUrl`. Relative variant URLs are joined
/// against `baseUrl`, falling back to `manifest_url`.
///
/// Names and hashes are opaque strings. Duplicate names and duplicate
/// `(type, uiMode)` pairs keep the first occurrence. Entries with an empty
/// name or hash, or without variants, are dropped.
pub fn parse_manifest(body: &[u8], manifest_url: &str) -> Result<Vec<ManifestEntry>, FetchError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;

    let (entries, base_url) = if value.is_array() {
        (serde_json::from_value::<Vec<ManifestEntry>>(value)?, None)
    } else {
        let envelope: ManifestEnvelope = serde_json::from_value(value)?;
        (envelope.assets, envelope.base_url)
    };

    let base = base_url
        .as_deref()
        .or(Some(manifest_url))
        .and_then(|u| Url::parse(u).ok());

    let mut seen_names = HashSet::new();
    let mut result = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.name.is_empty() || entry.hash.is_empty() {
            warn!(
                name = %entry.name,
                hash = %entry.hash,
                "Manifest entry without name or hash, skipping"
            );
            continue;
        }

        if !seen_names.insert(entry.name.clone()) {
            warn!(name = %entry.name, "Duplicate manifest entry ignored");
            continue;
        }

        let variants = normalize_variants(&entry, base.as_ref())?;
        if variants.is_empty() {
            warn!(name = %entry.name, "Manifest entry has no variants, skipping");
            continue;
        }

        result.push(ManifestEntry {
            name: entry.name,
            hash: entry.hash,
            variants,
        });
    }

    Ok(result)
}

fn normalize_variants(
    entry: &ManifestEntry,
    base: Option<&Url>,
) -> Result<Vec<ManifestVariant>, FetchError> {
    let mut seen = HashSet::new();
    let mut variants = Vec::with_capacity(entry.variants.len());

    for variant in &entry.variants {
        if !seen.insert(variant.key()) {
            warn!(
                name = %entry.name,
                variant = %variant.key(),
                url = %variant.url,
                "Duplicate variant ignored, first URL wins"
            );
            continue;
        }
        variants.push(ManifestVariant {
            url: resolve_url(base, &variant.url)?,
            ..variant.clone()
        });
    }

    Ok(variants)
}

fn resolve_url(base: Option<&Url>, raw: &str) -> Result<String, FetchError> {
    if let Ok(url) = Url::parse(raw) {
        return Ok(url.to_string());
    }
    let base = base.ok_or_else(|| FetchError::InvalidUrl(raw.to_string()))?;
    base.join(raw)
        .map(|u| u.to_string())
        .map_err(|_| FetchError::InvalidUrl(raw.to_string()))
}
