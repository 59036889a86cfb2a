// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Asset type definitions
//!
//! These types describe the remote manifest, the variants published for a
//! logical asset, and the values handed to the rendering layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Image format of a published variant
///
/// Doubles as the file extension used when storing a variant on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// Vector image
    #[serde(alias = "SVG")]
    Svg,
    /// JPEG raster image
    #[serde(alias = "JPG", alias = "jpeg", alias = "JPEG")]
    Jpg,
    /// WebP raster image
    #[serde(alias = "WEBP")]
    Webp,
}

impl AssetType {
    /// Fallback preference: vector first, then the smaller raster format,
    /// then the universal raster format.
    pub const PREFERENCE: [AssetType; 3] = [AssetType::Svg, AssetType::Webp, AssetType::Jpg];

    /// File extension for this type
    pub fn extension(&self) -> &'static str {
        match self {
            AssetType::Svg => "svg",
            AssetType::Jpg => "jpg",
            AssetType::Webp => "webp",
        }
    }

    /// Parse a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(AssetType::Svg),
            "jpg" | "jpeg" => Some(AssetType::Jpg),
            "webp" => Some(AssetType::Webp),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Display context selecting an image rendition
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    /// Light appearance (also the default mode)
    #[default]
    #[serde(alias = "LIGHT", alias = "default", alias = "DEFAULT")]
    Light,
    /// Dark appearance
    #[serde(alias = "DARK")]
    Dark,
}

impl UiMode {
    /// Mode used when a mode-specific variant was not published
    pub const DEFAULT: UiMode = UiMode::Light;

    /// Stable lowercase name, used as the stored file stem
    pub fn as_str(&self) -> &'static str {
        match self {
            UiMode::Light => "light",
            UiMode::Dark => "dark",
        }
    }

    /// Parse a mode name (case-insensitive, `default` maps to light)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" | "default" => Some(UiMode::Light),
            "dark" => Some(UiMode::Dark),
            _ => None,
        }
    }
}

impl std::fmt::Display for UiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete (type, UI mode) rendition of a named asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub asset_type: AssetType,
    pub ui_mode: UiMode,
}

impl VariantKey {
    pub fn new(asset_type: AssetType, ui_mode: UiMode) -> Self {
        Self {
            asset_type,
            ui_mode,
        }
    }

    /// File name of this variant inside a stored `(name, hash)` directory
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.ui_mode.as_str(), self.asset_type.extension())
    }

    /// Inverse of [`VariantKey::file_name`]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        Some(Self::new(
            AssetType::from_extension(ext)?,
            UiMode::parse(stem)?,
        ))
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.asset_type, self.ui_mode)
    }
}

/// One downloadable rendition listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestVariant {
    /// Image format
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// UI mode (defaults to light when omitted)
    #[serde(default)]
    pub ui_mode: UiMode,
    /// Absolute URL, or a path relative to the manifest base URL
    pub url: String,
    /// Optional SHA-256 checksum in format "sha256:hexstring"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl ManifestVariant {
    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.asset_type, self.ui_mode)
    }
}

/// A logical asset family as described by the remote manifest
///
/// Immutable once parsed; lives for one sync cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Unique identifier of the asset family
    pub name: String,
    /// Content digest of the current version
    pub hash: String,
    /// Ordered, de-duplicated variants
    pub variants: Vec<ManifestVariant>,
}

impl ManifestEntry {
    pub fn variant(&self, key: VariantKey) -> Option<&ManifestVariant> {
        self.variants.iter().find(|v| v.key() == key)
    }
}

/// A committed version of a named asset with the bytes of every variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub hash: String,
    pub variants: BTreeMap<VariantKey, Vec<u8>>,
}

impl Asset {
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
            variants: BTreeMap::new(),
        }
    }

    /// Add a variant's bytes (builder style)
    pub fn with_variant(mut self, key: VariantKey, data: impl Into<Vec<u8>>) -> Self {
        self.variants.insert(key, data.into());
        self
    }

    /// Total size of all variant payloads in bytes
    pub fn size_bytes(&self) -> usize {
        self.variants.values().map(Vec::len).sum()
    }
}

/// Lookup key for decoded images: `name + type + uiMode`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: String,
    pub variant: VariantKey,
}

impl CacheKey {
    pub fn new(name: impl Into<String>, variant: VariantKey) -> Self {
        Self {
            name: name.into(),
            variant,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.variant)
    }
}

/// Render-ready image produced by an [`ImageDecoder`](crate::decoder::ImageDecoder)
///
/// `pixels` is whatever the platform renderer consumes: raw pixels for a
/// rasterizing decoder, or the validated encoded bytes for a pass-through one.
/// Dimensions are `None` when the decoder could not determine them (e.g.
/// vector images without intrinsic size).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub asset_type: AssetType,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pixels: Arc<[u8]>,
}

impl DecodedImage {
    /// Approximate in-memory footprint, used for the cache byte budget
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }
}

/// Result of [`AssetService::load_asset`](crate::service::AssetService::load_asset)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAsset {
    pub name: String,
    pub hash: String,
    /// Variant actually served (may differ from the requested one)
    pub variant: VariantKey,
    pub image: Arc<DecodedImage>,
}
