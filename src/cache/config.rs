//! Page cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_PAGE_TTL_SECONDS: u64 = 20;
const DEFAULT_CAPACITY: usize = 64;

/// Settings for the rendered-listing cache, mirrored from `[cache]`.
#[derive(Debug, Clone)]
pub struct PageCacheConfig {
    /// Serve the main listing from the cache.
    pub enabled: bool,
    /// Seconds a cached page stays valid. Mutations do not shorten this.
    pub page_ttl_seconds: u64,
    /// Maximum cached pages before least-recently-used eviction.
    pub capacity: usize,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_ttl_seconds: DEFAULT_PAGE_TTL_SECONDS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for PageCacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            page_ttl_seconds: settings.page_ttl_seconds,
            capacity: settings.capacity,
        }
    }
}

impl PageCacheConfig {
    /// A zero TTL caches nothing, so it counts as disabled too.
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.page_ttl_seconds > 0
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.page_ttl_seconds)
    }

    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = PageCacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.page_ttl_seconds, 20);
        assert_eq!(config.capacity, 64);
        assert_eq!(config.ttl(), Duration::from_secs(20));
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let config = PageCacheConfig {
            page_ttl_seconds: 0,
            ..Default::default()
        };
        assert!(!config.is_enabled());
    }

    #[test]
    fn capacity_non_zero_clamps() {
        let config = PageCacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
    }
}
