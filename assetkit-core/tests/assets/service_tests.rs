// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for AssetService
//!
//! Scenarios:
//! - Loading is idempotent and decodes once
//! - Missing variants fall back, missing names yield nothing
//! - A sync that changes a hash invalidates cached images

use std::sync::Arc;

use assetkit_core::{Asset, AssetType, UiMode, VariantKey};

use super::support::*;

#[tokio::test]
async fn test_load_is_idempotent_and_cached() {
    let h = Harness::new(vec![svg_entry("logo", "h1")]);
    h.fetcher.serve(url("logo", "h1", UiMode::Light, AssetType::Svg), SVG_H1);
    h.service.update_all_assets().await.unwrap();

    let first = h
        .service
        .load_asset("logo", AssetType::Svg, UiMode::Light)
        .await
        .unwrap();
    let second = h
        .service
        .load_asset("logo", AssetType::Svg, UiMode::Light)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first.image, &second.image));
    assert_eq!(first.hash, "h1");
    assert_eq!(&*first.image.pixels, SVG_H1);
    assert_eq!(h.decoder.calls(), 1);
    assert_eq!(h.service.cache_stats().hits, 1);
}

#[tokio::test]
async fn test_concurrent_loads_decode_once() {
    let h = Harness::new(vec![]);
    h.service
        .store()
        .put(&Asset::new("logo", "h1").with_variant(
            VariantKey::new(AssetType::Svg, UiMode::Light),
            SVG_H1,
        ))
        .unwrap();

    let (a, b) = tokio::join!(
        h.service.load_asset("logo", AssetType::Svg, UiMode::Light),
        h.service.load_asset("logo", AssetType::Svg, UiMode::Light)
    );

    assert!(Arc::ptr_eq(&a.unwrap().image, &b.unwrap().image));
    assert_eq!(h.decoder.calls(), 1);
}

#[tokio::test]
async fn test_fallback_variant_served() {
    let h = Harness::new(vec![]);
    h.service
        .store()
        .put(&Asset::new("logo", "h1").with_variant(
            VariantKey::new(AssetType::Svg, UiMode::Light),
            SVG_H1,
        ))
        .unwrap();

    let loaded = h
        .service
        .load_asset("logo", AssetType::Jpg, UiMode::Dark)
        .await
        .unwrap();

    assert_eq!(
        loaded.variant,
        VariantKey::new(AssetType::Svg, UiMode::Light)
    );
    assert_eq!(loaded.image.asset_type, AssetType::Svg);
}

#[tokio::test]
async fn test_exact_variant_preferred() {
    let h = Harness::new(vec![]);
    h.service
        .store()
        .put(
            &Asset::new("logo", "h1")
                .with_variant(VariantKey::new(AssetType::Svg, UiMode::Light), SVG_H1)
                .with_variant(VariantKey::new(AssetType::Jpg, UiMode::Dark), JPG),
        )
        .unwrap();

    let loaded = h
        .service
        .load_asset("logo", AssetType::Jpg, UiMode::Dark)
        .await
        .unwrap();

    assert_eq!(loaded.variant, VariantKey::new(AssetType::Jpg, UiMode::Dark));
}

#[tokio::test]
async fn test_missing_name_returns_none() {
    let h = Harness::new(vec![]);

    let loaded = h
        .service
        .load_asset("missing", AssetType::Svg, UiMode::Light)
        .await;

    assert!(loaded.is_none());
    assert_eq!(h.decoder.calls(), 0);
}

#[tokio::test]
async fn test_undecodable_bytes_return_none() {
    let h = Harness::new(vec![]);
    h.service
        .store()
        .put(&Asset::new("logo", "h1").with_variant(
            VariantKey::new(AssetType::Jpg, UiMode::Light),
            b"definitely not a jpeg".to_vec(),
        ))
        .unwrap();

    let loaded = h
        .service
        .load_asset("logo", AssetType::Jpg, UiMode::Light)
        .await;

    assert!(loaded.is_none());
    assert!(h.service.cache_stats().entries == 0);
}

#[tokio::test]
async fn test_update_invalidates_cached_image() {
    let h = Harness::new(vec![svg_entry("logo", "h1")]);
    h.fetcher.serve(url("logo", "h1", UiMode::Light, AssetType::Svg), SVG_H1);
    h.fetcher.serve(url("logo", "h2", UiMode::Light, AssetType::Svg), SVG_H2);
    h.service.update_all_assets().await.unwrap();

    let before = h
        .service
        .load_asset("logo", AssetType::Svg, UiMode::Light)
        .await
        .unwrap();
    assert_eq!(before.hash, "h1");

    h.manifest.set_entries(vec![svg_entry("logo", "h2")]);
    h.service.update_all_assets().await.unwrap();
    assert_eq!(h.service.cache_stats().entries, 0);

    let after = h
        .service
        .load_asset("logo", AssetType::Svg, UiMode::Light)
        .await
        .unwrap();
    assert_eq!(after.hash, "h2");
    assert_eq!(&*after.image.pixels, SVG_H2);
}

#[tokio::test]
async fn test_store_survives_service_restart() {
    let h = Harness::new(vec![svg_entry("logo", "h1")]);
    h.fetcher.serve(url("logo", "h1", UiMode::Light, AssetType::Svg), SVG_H1);
    h.service.update_all_assets().await.unwrap();

    let reopened = assetkit_core::AssetService::new(
        test_config(&h.temp),
        MockManifestClient::new(vec![]),
        MockFetcher::new(),
        Arc::new(assetkit_core::SignatureDecoder),
    )
    .unwrap();

    let loaded = reopened
        .load_asset("logo", AssetType::Svg, UiMode::Light)
        .await
        .unwrap();
    assert_eq!(loaded.hash, "h1");
}
