// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory cache of decoded images
//!
//! Bounded by entry count and by total decoded bytes, evicting least recently
//! used entries first. Entries are derived data: each remembers the asset hash
//! it was decoded from and is never treated as authoritative.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::types::{CacheKey, DecodedImage};

#[derive(Debug, Clone)]
struct CachedImage {
    hash: String,
    image: Arc<DecodedImage>,
}

struct CacheState {
    lru: LruCache<CacheKey, CachedImage>,
    bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub bytes: usize,
}

impl ImageCacheStats {
    /// Hit rate in `[0, 1]`; zero before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of decoded images keyed by `name + type + uiMode`
pub struct ImageCache {
    state: Mutex<CacheState>,
    max_bytes: usize,
    in_flight: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl ImageCache {
    /// Create a cache holding at most `max_entries` images and `max_bytes`
    /// decoded bytes.
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                lru: LruCache::new(capacity),
                bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            max_bytes,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Look up an image regardless of the hash it was decoded from
    pub fn get_bitmap(&self, key: &CacheKey) -> Option<Arc<DecodedImage>> {
        let mut state = self.state.lock();
        match state.lru.get(key).map(|c| Arc::clone(&c.image)) {
            Some(image) => {
                state.hits += 1;
                Some(image)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Look up an image decoded from exactly `hash`
    ///
    /// An entry for an older hash is dropped and reported as a miss.
    pub fn get_bitmap_for(&self, key: &CacheKey, hash: &str) -> Option<Arc<DecodedImage>> {
        let mut state = self.state.lock();
        let cached = state.lru.get(key).map(|c| (c.hash == hash, Arc::clone(&c.image)));
        match cached {
            Some((true, image)) => {
                state.hits += 1;
                Some(image)
            }
            Some((false, _)) => {
                if let Some(stale) = state.lru.pop(key) {
                    state.bytes -= stale.image.size_bytes();
                }
                state.misses += 1;
                None
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Insert an image decoded from `hash`, evicting LRU entries as needed
    ///
    /// Images larger than the whole byte budget are not cached.
    pub fn put_bitmap(&self, key: CacheKey, hash: &str, image: Arc<DecodedImage>) {
        let size = image.size_bytes();
        if size > self.max_bytes {
            debug!(key = %key, size, max = self.max_bytes, "Image exceeds cache budget, not cached");
            return;
        }

        let mut state = self.state.lock();
        let entry = CachedImage {
            hash: hash.to_string(),
            image,
        };
        if let Some((old_key, old)) = state.lru.push(key.clone(), entry) {
            state.bytes -= old.image.size_bytes();
            if old_key != key {
                state.evictions += 1;
            }
        }
        state.bytes += size;

        while state.bytes > self.max_bytes {
            let Some((evicted_key, evicted)) = state.lru.pop_lru() else {
                break;
            };
            state.bytes -= evicted.image.size_bytes();
            state.evictions += 1;
            debug!(key = %evicted_key, "Image evicted for byte budget");
        }
    }

    /// Drop every entry for `name`; returns how many were removed
    pub fn invalidate_name(&self, name: &str) -> usize {
        let mut state = self.state.lock();
        let keys: Vec<CacheKey> = state
            .lru
            .iter()
            .filter(|(k, _)| k.name == name)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            if let Some(old) = state.lru.pop(key) {
                state.bytes -= old.image.size_bytes();
            }
        }
        keys.len()
    }

    /// Drop all entries
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.lru.clear();
        state.bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.state.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ImageCacheStats {
        let state = self.state.lock();
        ImageCacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            entries: state.lru.len(),
            bytes: state.bytes,
        }
    }

    /// Serialize decodes of the same key
    ///
    /// Holders should re-check the cache after acquiring: a previous holder
    /// may already have filled it.
    pub async fn decode_lock(&self, key: &CacheKey) -> DecodeGuard<'_> {
        let lock = {
            let mut in_flight = self.in_flight.lock();
            Arc::clone(
                in_flight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        let guard = lock.lock_owned().await;
        DecodeGuard {
            cache: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }
}

/// Exclusive right to decode one key; released on drop
pub struct DecodeGuard<'a> {
    cache: &'a ImageCache,
    key: CacheKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DecodeGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut in_flight = self.cache.in_flight.lock();
        // Only the map still references the lock: nobody is waiting
        if in_flight
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            in_flight.remove(&self.key);
        }
    }
}
