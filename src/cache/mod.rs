//! Cache
//!
//! Este módulo contiene los sistemas de cache.

pub mod cache_config;
pub mod ttl_cache;

pub use cache_config::CacheConfig;
pub use ttl_cache::TtlCache;
