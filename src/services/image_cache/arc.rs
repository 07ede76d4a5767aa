//! Adaptive replacement cache (Megiddo & Modha, FAST '03)
//!
//! Resident entries live in two LRU lists:
//! - `t1`: keys seen once recently
//! - `t2`: keys seen at least twice
//!
//! Keys evicted from either list are remembered without their value in the
//! ghost lists `b1` / `b2`. A later miss that lands in a ghost list tells us
//! which side was evicted too eagerly and moves the adaptive target `p` (the
//! desired size of `t1`) accordingly. A single sweep of distinct keys only
//! ever churns `t1`, so entries that earned their place in `t2` survive it.
//!
//! This type is not synchronized; [`super::ImageCache`] wraps it in a mutex.

use lru::LruCache;
use std::hash::Hash;

use crate::errors::{AppError, AppResult};

pub struct ArcCache<K: Hash + Eq, V> {
    capacity: usize,
    /// Target size of `t1`
    p: usize,
    t1: LruCache<K, V>,
    t2: LruCache<K, V>,
    b1: LruCache<K, ()>,
    b2: LruCache<K, ()>,
}

impl<K, V> ArcCache<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new(capacity: usize) -> AppResult<Self> {
        if capacity == 0 {
            return Err(AppError::configuration("cache capacity must be positive"));
        }

        Ok(Self {
            capacity,
            p: 0,
            t1: LruCache::unbounded(),
            t2: LruCache::unbounded(),
            b1: LruCache::unbounded(),
            b2: LruCache::unbounded(),
        })
    }

    /// Look up a key, promoting it to the frequency list on a hit
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if let Some(value) = self.t1.pop(key) {
            self.t2.put(key.clone(), value);
            return self.t2.peek(key);
        }
        self.t2.get(key)
    }

    /// Check residency without touching recency or frequency
    pub fn contains(&self, key: &K) -> bool {
        self.t1.contains(key) || self.t2.contains(key)
    }

    /// Insert or overwrite a value
    pub fn put(&mut self, key: K, value: V) {
        // Resident in t1: second sighting, move to t2
        if self.t1.contains(&key) {
            self.t1.pop(&key);
            self.t2.put(key, value);
            return;
        }

        // Resident in t2: refresh
        if self.t2.contains(&key) {
            self.t2.put(key, value);
            return;
        }

        // Ghost hit in b1: recency side was too small
        if self.b1.contains(&key) {
            let delta = (self.b2.len() / self.b1.len()).max(1);
            self.p = (self.p + delta).min(self.capacity);

            if self.resident_len() >= self.capacity {
                self.replace(false);
            }
            self.b1.pop(&key);
            self.t2.put(key, value);
            return;
        }

        // Ghost hit in b2: frequency side was too small
        if self.b2.contains(&key) {
            let delta = (self.b1.len() / self.b2.len()).max(1);
            self.p = self.p.saturating_sub(delta);

            if self.resident_len() >= self.capacity {
                self.replace(true);
            }
            self.b2.pop(&key);
            self.t2.put(key, value);
            return;
        }

        // Complete miss
        if self.resident_len() >= self.capacity {
            self.replace(false);
        }

        // Keep the ghost lists bounded
        while self.b1.len() > self.capacity - self.p {
            self.b1.pop_lru();
        }
        while self.b2.len() > self.p {
            self.b2.pop_lru();
        }

        self.t1.put(key, value);
    }

    /// Evict one resident entry into the matching ghost list
    fn replace(&mut self, b2_contains_key: bool) {
        let t1_len = self.t1.len();
        let prefer_t1 = t1_len > 0 && (t1_len > self.p || (t1_len == self.p && b2_contains_key));

        if prefer_t1 || self.t2.is_empty() {
            if let Some((key, _)) = self.t1.pop_lru() {
                self.b1.put(key, ());
            }
        } else if let Some((key, _)) = self.t2.pop_lru() {
            self.b2.put(key, ());
        }
    }

    fn resident_len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    pub fn len(&self) -> usize {
        self.resident_len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident_len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn target_recent(&self) -> usize {
        self.p
    }

    pub fn recent_len(&self) -> usize {
        self.t1.len()
    }

    pub fn frequent_len(&self) -> usize {
        self.t2.len()
    }

    pub fn ghost_len(&self) -> usize {
        self.b1.len() + self.b2.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(ArcCache::<u32, u32>::new(0).is_err());
    }

    #[test]
    fn test_basic_get_put() {
        let mut cache = ArcCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), None);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut cache = ArcCache::new(4).unwrap();
        for i in 0..100u32 {
            cache.put(i, i);
            if i % 3 == 0 {
                cache.get(&(i / 2));
            }
            assert!(cache.len() <= 4);
            assert!(cache.ghost_len() <= 8);
        }
    }

    #[test]
    fn test_second_access_promotes_to_frequent() {
        let mut cache = ArcCache::new(4).unwrap();
        cache.put("a", 1);
        assert_eq!((cache.recent_len(), cache.frequent_len()), (1, 0));

        cache.get(&"a");
        assert_eq!((cache.recent_len(), cache.frequent_len()), (0, 1));
    }

    #[test]
    fn test_scan_does_not_evict_frequent_entries() {
        let mut cache = ArcCache::new(4).unwrap();
        cache.put("hot-1".to_string(), 1);
        cache.put("hot-2".to_string(), 2);
        cache.get(&"hot-1".to_string());
        cache.get(&"hot-2".to_string());

        for i in 0..50 {
            cache.put(format!("scan-{i}"), i);
        }

        assert_eq!(cache.get(&"hot-1".to_string()), Some(&1));
        assert_eq!(cache.get(&"hot-2".to_string()), Some(&2));
        assert!(!cache.contains(&"scan-0".to_string()));
    }

    #[test]
    fn test_ghost_hit_grows_recency_target() {
        let mut cache = ArcCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        // evicts "a" into b1
        cache.put("c", 3);
        assert!(!cache.contains(&"a"));
        assert_eq!(cache.target_recent(), 0);

        cache.put("a", 10);
        assert_eq!(cache.target_recent(), 1);
        assert_eq!(cache.get(&"a"), Some(&10));
        assert!(cache.len() <= 2);
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let mut cache = ArcCache::new(3).unwrap();
        cache.put("a", 1);
        cache.put("a", 2);
        cache.put("a", 3);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a"), Some(&3));
    }
}
