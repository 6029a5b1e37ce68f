use anyhow::Result;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use super::CacheConfig;

/// Cliente Redis con connection manager y operaciones async
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    /// Crear nuevo cliente Redis
    pub async fn new(config: CacheConfig) -> Result<Self> {
        info!("🔗 Conectando a Redis: {}", config.redis_url);

        let client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager, config })
    }

    pub fn default_ttl(&self) -> u64 {
        self.config.default_ttl
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        match &value {
            Some(_) => debug!("📥 Cache HIT para clave: {}", key),
            None => debug!("❌ Cache MISS para clave: {}", key),
        }
        Ok(value)
    }

    pub async fn set_raw(&self, key: &str, value: &str, ttl: u64) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!("💾 Cache SET para clave: {} (TTL: {}s)", key, ttl);
        Ok(())
    }

    /// Borrar todas las claves que coinciden con el patrón (SCAN + DEL)
    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.manager.clone();
        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let removed: usize = redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("🗑️ Cache DELETE para patrón: {} (eliminados: {})", pattern, deleted);
        Ok(deleted)
    }

    /// Encolar un mensaje al final de una lista
    pub async fn rpush(&self, list: &str, payload: &str) -> Result<usize> {
        let mut conn = self.manager.clone();
        let length: usize = redis::cmd("RPUSH")
            .arg(list)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(length)
    }
}
