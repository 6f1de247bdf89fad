//! Page cache for the main post listing.
//!
//! Pages are memoised for a fixed TTL and bounded by an LRU capacity:
//!
//! ```toml
//! [cache]
//! enabled = true
//! page_ttl_seconds = 20
//! capacity = 64
//! ```
//!
//! The cache is never invalidated by writes; `PageCache::clear` is the only
//! way to drop pages before they expire.

mod config;
mod lock;
mod store;

pub use config::PageCacheConfig;
pub use store::{PAGE_CACHE_COUNTERS, PageCache};
