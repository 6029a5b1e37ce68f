//! Configuración de cache
//!
//! Este módulo contiene la configuración para el sistema de cache.

use crate::config::environment::EnvironmentConfig;

/// Configuración del cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub redis_url: String,
    pub default_ttl: u64,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            default_ttl: 60,
            enabled: true,
        }
    }
}

impl From<&EnvironmentConfig> for CacheConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            redis_url: config.redis_url.clone(),
            default_ttl: config.cache_ttl_seconds,
            enabled: config.cache_enabled,
        }
    }
}
