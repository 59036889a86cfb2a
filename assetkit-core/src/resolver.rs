// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Variant resolution
//!
//! Picks the stored variant that best serves a `(type, uiMode)` request:
//!
//! 1. exact `(type, uiMode)`
//! 2. same type at the default UI mode
//! 3. the other types in [`AssetType::PREFERENCE`] order, each tried at the
//!    requested mode and then at the default mode
//!
//! Nothing matching yields `None`; callers render their own placeholder.

use std::collections::BTreeSet;

use crate::store::AssetStore;
use crate::types::{AssetType, UiMode, VariantKey};

/// A request resolved against the committed version of an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub hash: String,
    pub variant: VariantKey,
}

impl Resolution {
    /// Whether the served variant is the one that was asked for
    pub fn is_exact(&self, requested: VariantKey) -> bool {
        self.variant == requested
    }
}

/// Stateless resolver over a store's committed variants
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantResolver;

impl VariantResolver {
    /// Candidate variants for `requested`, most preferred first.
    pub fn candidates(requested: VariantKey) -> Vec<VariantKey> {
        let mut modes = vec![requested.ui_mode];
        if requested.ui_mode != UiMode::DEFAULT {
            modes.push(UiMode::DEFAULT);
        }

        let types = std::iter::once(requested.asset_type).chain(
            AssetType::PREFERENCE
                .into_iter()
                .filter(move |t| *t != requested.asset_type),
        );

        types
            .flat_map(|t| modes.iter().map(move |m| VariantKey::new(t, *m)))
            .collect()
    }

    /// First candidate present in `available`.
    pub fn resolve(available: &BTreeSet<VariantKey>, requested: VariantKey) -> Option<VariantKey> {
        Self::candidates(requested)
            .into_iter()
            .find(|k| available.contains(k))
    }

    /// Resolve against the committed version of `name` in `store`.
    pub fn resolve_in(
        store: &AssetStore,
        name: &str,
        asset_type: AssetType,
        ui_mode: UiMode,
    ) -> Option<Resolution> {
        let stored = store.stored(name)?;
        let variant = Self::resolve(&stored.variants, VariantKey::new(asset_type, ui_mode))?;
        Some(Resolution {
            name: name.to_string(),
            hash: stored.hash,
            variant,
        })
    }
}
