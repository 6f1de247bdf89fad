//! Time-limited memo of rendered listing pages.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use super::config::PageCacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const HIT_TOTAL: &str = "quillhub_page_cache_hit_total";
const MISS_TOTAL: &str = "quillhub_page_cache_miss_total";
const EVICT_TOTAL: &str = "quillhub_page_cache_evict_total";

/// Counters emitted by [`PageCache`], with their descriptions.
pub const PAGE_CACHE_COUNTERS: [(&str, &str); 3] = [
    (HIT_TOTAL, "Listing pages served from the page cache."),
    (
        MISS_TOTAL,
        "Listing page lookups that had to query the content store.",
    ),
    (
        EVICT_TOTAL,
        "Cached listing pages dropped to stay within capacity.",
    ),
];

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Whole-page cache keyed by request key (e.g. `index?page=2`).
///
/// Entries live for a fixed TTL. Writes to the content store never touch the
/// cache, so a page can be served stale until it expires or `clear` runs.
pub struct PageCache<V> {
    enabled: bool,
    ttl: Duration,
    entries: RwLock<LruCache<String, Entry<V>>>,
}

impl<V: Clone> PageCache<V> {
    pub fn new(config: &PageCacheConfig) -> Self {
        Self {
            enabled: config.is_enabled(),
            ttl: config.ttl(),
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn disabled() -> Self {
        Self::new(&PageCacheConfig {
            enabled: false,
            ..Default::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lookup(key, Instant::now())
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key.into(), value, Instant::now());
    }

    pub(crate) fn lookup(&self, key: &str, now: Instant) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let mut entries = rw_write(&self.entries, SOURCE, "lookup");
        let fresh = match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        };

        match fresh {
            Some(value) => {
                counter!(HIT_TOTAL).increment(1);
                debug!(target = "quillhub::cache", key, "page cache hit");
                Some(value)
            }
            None => {
                counter!(MISS_TOTAL).increment(1);
                None
            }
        }
    }

    pub(crate) fn insert_at(&self, key: String, value: V, now: Instant) {
        if !self.enabled {
            return;
        }

        let Some(expires_at) = now.checked_add(self.ttl) else {
            debug!(
                target = "quillhub::cache",
                key = %key,
                "page cache ttl overflows the clock; not caching"
            );
            return;
        };
        let entry = Entry { value, expires_at };
        let evicted = rw_write(&self.entries, SOURCE, "insert").push(key.clone(), entry);
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!(EVICT_TOTAL).increment(1);
            debug!(
                target = "quillhub::cache",
                key = %evicted_key,
                "page cache evicted least recently used entry"
            );
        }
    }

    /// Drop every cached page.
    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> PageCache<String> {
        PageCache::new(&PageCacheConfig {
            enabled: true,
            page_ttl_seconds: 20,
            capacity,
        })
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = cache(4);
        let start = Instant::now();
        cache.insert_at("index?page=1".into(), "page one".into(), start);

        let within = start + Duration::from_secs(19);
        assert_eq!(
            cache.lookup("index?page=1", within).as_deref(),
            Some("page one")
        );

        let after = start + Duration::from_secs(20);
        assert!(cache.lookup("index?page=1", after).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let cache = cache(4);
        cache.insert("index?page=1", "one".to_string());
        cache.insert("index?page=2", "two".to_string());
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.get("index?page=1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn least_recently_used_page_is_evicted() {
        let cache = cache(2);
        cache.insert("index?page=1", "one".to_string());
        cache.insert("index?page=2", "two".to_string());
        assert!(cache.get("index?page=1").is_some());

        cache.insert("index?page=3", "three".to_string());
        assert!(cache.get("index?page=2").is_none());
        assert!(cache.get("index?page=1").is_some());
        assert!(cache.get("index?page=3").is_some());
    }

    #[test]
    fn unrepresentable_expiry_skips_caching() {
        let cache = PageCache::new(&PageCacheConfig {
            enabled: true,
            page_ttl_seconds: u64::MAX,
            capacity: 4,
        });
        cache.insert("index?page=1", "one".to_string());
        assert!(cache.get("index?page=1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = PageCache::<String>::disabled();
        cache.insert("index?page=1", "one".to_string());
        assert!(!cache.is_enabled());
        assert!(cache.get("index?page=1").is_none());
        assert!(cache.is_empty());
    }
}
