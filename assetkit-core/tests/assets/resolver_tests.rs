// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for variant resolution

use std::collections::BTreeSet;

use assetkit_core::{Asset, AssetStore, AssetType, UiMode, VariantKey, VariantResolver};
use proptest::prelude::*;
use tempfile::TempDir;

fn asset_type_strategy() -> impl Strategy<Value = AssetType> {
    prop_oneof![
        Just(AssetType::Svg),
        Just(AssetType::Jpg),
        Just(AssetType::Webp)
    ]
}

fn ui_mode_strategy() -> impl Strategy<Value = UiMode> {
    prop_oneof![Just(UiMode::Light), Just(UiMode::Dark)]
}

fn variant_key_strategy() -> impl Strategy<Value = VariantKey> {
    (asset_type_strategy(), ui_mode_strategy()).prop_map(|(t, m)| VariantKey::new(t, m))
}

#[test]
fn test_dark_jpg_falls_back_to_light_svg() {
    let temp = TempDir::new().unwrap();
    let store = AssetStore::open(temp.path()).unwrap();
    store
        .put(
            &Asset::new("logo", "h1")
                .with_variant(VariantKey::new(AssetType::Svg, UiMode::Light), b"<svg/>".to_vec()),
        )
        .unwrap();

    let resolution =
        VariantResolver::resolve_in(&store, "logo", AssetType::Jpg, UiMode::Dark).unwrap();

    assert_eq!(resolution.hash, "h1");
    assert_eq!(
        resolution.variant,
        VariantKey::new(AssetType::Svg, UiMode::Light)
    );
    assert!(!resolution.is_exact(VariantKey::new(AssetType::Jpg, UiMode::Dark)));
}

#[test]
fn test_same_type_default_mode_beats_other_type_same_mode() {
    let available = BTreeSet::from([
        VariantKey::new(AssetType::Jpg, UiMode::Light),
        VariantKey::new(AssetType::Svg, UiMode::Dark),
    ]);

    let resolved =
        VariantResolver::resolve(&available, VariantKey::new(AssetType::Jpg, UiMode::Dark));

    assert_eq!(resolved, Some(VariantKey::new(AssetType::Jpg, UiMode::Light)));
}

#[test]
fn test_other_types_follow_preference_order() {
    let available = BTreeSet::from([
        VariantKey::new(AssetType::Jpg, UiMode::Light),
        VariantKey::new(AssetType::Webp, UiMode::Light),
    ]);

    let resolved =
        VariantResolver::resolve(&available, VariantKey::new(AssetType::Svg, UiMode::Light));

    assert_eq!(resolved, Some(VariantKey::new(AssetType::Webp, UiMode::Light)));
}

#[test]
fn test_unknown_name_resolves_to_none() {
    let temp = TempDir::new().unwrap();
    let store = AssetStore::open(temp.path()).unwrap();

    assert!(VariantResolver::resolve_in(&store, "missing", AssetType::Svg, UiMode::Light).is_none());
}

proptest! {
    #[test]
    fn prop_resolution_is_available_and_mode_compatible(
        available in prop::collection::btree_set(variant_key_strategy(), 0..6),
        requested in variant_key_strategy(),
    ) {
        let resolved = VariantResolver::resolve(&available, requested);
        let servable = available
            .iter()
            .any(|k| k.ui_mode == requested.ui_mode || k.ui_mode == UiMode::DEFAULT);

        prop_assert_eq!(resolved.is_some(), servable);
        if let Some(key) = resolved {
            prop_assert!(available.contains(&key));
        }
    }

    #[test]
    fn prop_exact_match_wins(
        available in prop::collection::btree_set(variant_key_strategy(), 0..6),
        requested in variant_key_strategy(),
    ) {
        let mut available = available;
        available.insert(requested);
        prop_assert_eq!(VariantResolver::resolve(&available, requested), Some(requested));
    }

    #[test]
    fn prop_candidates_cover_every_variant_once(requested in variant_key_strategy()) {
        let candidates = VariantResolver::candidates(requested);
        let unique: BTreeSet<_> = candidates.iter().copied().collect();
        prop_assert_eq!(unique.len(), candidates.len());
        prop_assert_eq!(candidates[0], requested);
        // Light requests never fall back to dark
        if requested.ui_mode == UiMode::Light {
            prop_assert!(candidates.iter().all(|k| k.ui_mode == UiMode::Light));
        }
    }
}
