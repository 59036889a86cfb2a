// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Platform Image Decoding
//!
//! Provides a callback interface for platform-specific image decoders.
//! iOS can use ImageIO/CoreSVG, Android BitmapFactory/AndroidSVG.

use std::sync::Arc;

use assetkit_core::{AssetType, DecodeError, DecodedImage, ImageDecoder};

use crate::types::MobileAssetType;

/// Image produced by a platform decoder.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileDecodedImage {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Whatever the platform renderer consumes (raw pixels or encoded bytes)
    pub pixels: Vec<u8>,
}

/// Callback interface for platform-specific image decoding.
///
/// Implement this trait in Swift (iOS) or Kotlin (Android). Called on a
/// background thread, at most once per cached variant.
#[uniffi::export(callback_interface)]
pub trait PlatformImageDecoder: Send + Sync {
    /// Decode the stored bytes of one variant.
    ///
    /// Returns None when the bytes cannot be decoded.
    fn decode(&self, asset_type: MobileAssetType, data: Vec<u8>) -> Option<MobileDecodedImage>;
}

/// Image decoder that delegates to a platform implementation.
pub struct PlatformDecoderAdapter {
    handler: Arc<dyn PlatformImageDecoder>,
}

impl PlatformDecoderAdapter {
    pub fn new(handler: Arc<dyn PlatformImageDecoder>) -> Self {
        Self { handler }
    }
}

impl ImageDecoder for PlatformDecoderAdapter {
    fn decode(&self, asset_type: AssetType, data: &[u8]) -> Result<DecodedImage, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let image = self
            .handler
            .decode(asset_type.into(), data.to_vec())
            .ok_or_else(|| DecodeError::Unsupported(format!("platform rejected {asset_type}")))?;

        Ok(DecodedImage {
            asset_type,
            width: image.width,
            height: image.height,
            pixels: Arc::from(image.pixels),
        })
    }
}
