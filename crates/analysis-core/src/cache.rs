use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::hash::Hash;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// Expiring key-value cache. Entries older than the TTL are treated as
/// missing and evicted on read.
pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::minutes(10)),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if now - entry.cached_at < self.ttl => return Some(entry.data.clone()),
            Some(_) => {}
            None => return None,
        }

        // Stale; the read guard is already dropped here
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: K, data: V) {
        self.insert_at(key, data, Utc::now());
    }

    fn insert_at(&self, key: K, data: V, cached_at: DateTime<Utc>) {
        self.entries.insert(key, CacheEntry { data, cached_at });
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
