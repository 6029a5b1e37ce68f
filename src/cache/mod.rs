//! Cache
//!
//! Este módulo contiene el cliente Redis y el cache de respuestas.

pub mod cache_config;
pub mod redis_client;
pub mod response_cache;

pub use cache_config::CacheConfig;
pub use response_cache::{build_cache_key, DisabledCache, RedisResponseCache, ResponseCache, REPAIRS_NAMESPACE};
