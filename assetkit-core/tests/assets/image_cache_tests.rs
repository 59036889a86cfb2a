// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the decoded image cache

use std::sync::Arc;

use assetkit_core::{AssetType, CacheKey, DecodedImage, ImageCache, UiMode, VariantKey};

fn key(name: &str, mode: UiMode) -> CacheKey {
    CacheKey::new(name, VariantKey::new(AssetType::Jpg, mode))
}

fn image(len: usize) -> Arc<DecodedImage> {
    Arc::new(DecodedImage {
        asset_type: AssetType::Jpg,
        width: Some(1),
        height: Some(1),
        pixels: Arc::from(vec![7u8; len]),
    })
}

#[test]
fn test_put_then_get_returns_same_image() {
    let cache = ImageCache::new(4, 1024);
    let img = image(16);
    cache.put_bitmap(key("logo", UiMode::Light), "h1", Arc::clone(&img));

    let hit = cache.get_bitmap(&key("logo", UiMode::Light)).unwrap();
    assert!(Arc::ptr_eq(&hit, &img));
}

#[test]
fn test_modes_are_separate_entries() {
    let cache = ImageCache::new(4, 1024);
    cache.put_bitmap(key("logo", UiMode::Light), "h1", image(1));

    assert!(cache.get_bitmap(&key("logo", UiMode::Dark)).is_none());
}

#[test]
fn test_stats_track_hits_and_misses() {
    let cache = ImageCache::new(4, 1024);
    cache.put_bitmap(key("logo", UiMode::Light), "h1", image(10));

    cache.get_bitmap(&key("logo", UiMode::Light));
    cache.get_bitmap(&key("logo", UiMode::Light));
    cache.get_bitmap(&key("banner", UiMode::Light));

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.bytes, 10);
    assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
}

#[test]
fn test_byte_budget_never_exceeded() {
    let cache = ImageCache::new(100, 50);
    for i in 0..20 {
        cache.put_bitmap(key(&format!("a{}", i), UiMode::Light), "h", image(7));
        assert!(cache.stats().bytes <= 50);
    }
    assert_eq!(cache.len(), 7);
}

#[test]
fn test_clear() {
    let cache = ImageCache::new(4, 1024);
    cache.put_bitmap(key("logo", UiMode::Light), "h1", image(1));
    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.stats().bytes, 0);
}

#[tokio::test]
async fn test_decode_lock_serializes_same_key() {
    let cache = Arc::new(ImageCache::new(4, 1024));
    let k = key("logo", UiMode::Light);

    let guard = cache.decode_lock(&k).await;
    let waiter = {
        let cache = Arc::clone(&cache);
        let k = k.clone();
        tokio::spawn(async move {
            let _guard = cache.decode_lock(&k).await;
            // The first holder filled the cache before releasing
            cache.get_bitmap_for(&k, "h1").is_some()
        })
    };

    tokio::task::yield_now().await;
    cache.put_bitmap(k.clone(), "h1", image(4));
    drop(guard);

    assert!(waiter.await.unwrap());
}
