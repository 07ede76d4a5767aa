//! Concurrency-safe wrapper around the ARC policy

use bytes::Bytes;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::trace;

use super::arc::ArcCache;
use super::key::CacheKey;
use crate::errors::AppResult;

/// Shared image cache; values are immutable encoded images
pub struct ImageCache {
    // Lookups reorder the recency lists, so reads need exclusive access too
    inner: Mutex<ArcCache<CacheKey, Bytes>>,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
}

/// Point-in-time cache counters for health reporting
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub entries: usize,
    pub capacity: usize,
    pub recent_entries: usize,
    pub frequent_entries: usize,
    pub target_recent: usize,
}

impl ImageCache {
    pub fn new(capacity: usize) -> AppResult<Self> {
        Ok(Self {
            inner: Mutex::new(ArcCache::new(capacity)?),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
        })
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let found = self.inner.lock().await.get(key).cloned();

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("Image cache hit: {}", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!("Image cache miss: {}", key);
        }
        found
    }

    /// Store a value; a concurrent duplicate put simply overwrites
    pub async fn put(&self, key: CacheKey, value: Bytes) {
        trace!("Image cache put: {} ({} bytes)", key, value.len());
        self.inner.lock().await.put(key, value);
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().await.contains(key)
    }

    pub async fn stats(&self) -> ImageCacheStats {
        let inner = self.inner.lock().await;
        ImageCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            entries: inner.len(),
            capacity: inner.capacity(),
            recent_entries: inner.recent_len(),
            frequent_entries: inner.frequent_len(),
            target_recent: inner.target_recent(),
        }
    }
}
