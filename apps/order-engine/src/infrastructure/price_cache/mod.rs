//! Price Cache Adapters
//!
//! Implementations of [`PriceCachePort`](crate::application::ports::PriceCachePort).

mod in_memory;
mod redis_cache;

pub use in_memory::InMemoryPriceCache;
pub use redis_cache::RedisPriceCache;
