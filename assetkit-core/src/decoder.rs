// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Decoder capability
//!
//! Turning stored bytes into something renderable is the host application's
//! job. [`ImageDecoder`] is the seam; [`SignatureDecoder`] is a pass-through
//! implementation that validates the format signature, sniffs raster
//! dimensions and leaves rasterization to the platform.

use std::sync::Arc;

use thiserror::Error;

use crate::types::{AssetType, DecodedImage};

/// Errors produced while decoding stored bytes
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Nothing to decode
    #[error("Empty payload")]
    Empty,

    /// Bytes do not carry the signature of the declared type
    #[error("Payload is not a valid {expected} image")]
    UnrecognizedFormat {
        /// Declared type
        expected: AssetType,
    },

    /// Decoder cannot handle this payload
    #[error("Unsupported image: {0}")]
    Unsupported(String),
}

/// Decodes one stored variant into a render-ready image
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, asset_type: AssetType, data: &[u8]) -> Result<DecodedImage, DecodeError>;
}

/// Signature-checking pass-through decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureDecoder;

impl ImageDecoder for SignatureDecoder {
    fn decode(&self, asset_type: AssetType, data: &[u8]) -> Result<DecodedImage, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let dimensions = match asset_type {
            AssetType::Svg => {
                if !looks_like_svg(data) {
                    return Err(DecodeError::UnrecognizedFormat {
                        expected: asset_type,
                    });
                }
                None
            }
            AssetType::Jpg => {
                if !data.starts_with(&[0xFF, 0xD8, 0xFF]) {
                    return Err(DecodeError::UnrecognizedFormat {
                        expected: asset_type,
                    });
                }
                jpeg_dimensions(data)
            }
            AssetType::Webp => {
                if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WEBP" {
                    return Err(DecodeError::UnrecognizedFormat {
                        expected: asset_type,
                    });
                }
                webp_dimensions(data)
            }
        };

        Ok(DecodedImage {
            asset_type,
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            pixels: Arc::from(data),
        })
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(4096)];
    let Ok(text) = std::str::from_utf8(head).or_else(|e| std::str::from_utf8(&head[..e.valid_up_to()]))
    else {
        return false;
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with('<') && text.contains("<svg")
}

/// Width and height from the first SOFn segment.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes and standalone markers carry no length
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let seg = data.get(pos + 4..pos + 9)?;
            let height = u16::from_be_bytes([seg[1], seg[2]]) as u32;
            let width = u16::from_be_bytes([seg[3], seg[4]]) as u32;
            return Some((width, height));
        }
        pos += 2 + len;
    }
    None
}

/// Canvas size from the first WebP chunk (VP8, VP8L or VP8X).
fn webp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let chunk = data.get(12..16)?;
    let body = data.get(20..)?;
    match chunk {
        b"VP8X" => {
            let b = body.get(4..10)?;
            let w = 1 + u32::from_le_bytes([b[0], b[1], b[2], 0]);
            let h = 1 + u32::from_le_bytes([b[3], b[4], b[5], 0]);
            Some((w, h))
        }
        b"VP8L" => {
            let b = body.get(1..5)?;
            let bits = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
            Some(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
        }
        b"VP8 " => {
            let b = body.get(6..10)?;
            let w = u16::from_le_bytes([b[0], b[1]]) & 0x3FFF;
            let h = u16::from_le_bytes([b[2], b[3]]) & 0x3FFF;
            Some((w as u32, h as u32))
        }
        _ => None,
    }
}
