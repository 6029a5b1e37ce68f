//! Cache de respuestas
//!
//! Cache read-through de respuestas JSON, con clave por ruta, query e
//! identidad del usuario. Las fallas del cache se registran y nunca hacen
//! fallar la request.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::redis_client::RedisClient;

/// Namespace de los listados de reparaciones
pub const REPAIRS_NAMESPACE: &str = "repairs";

/// Clave `cache:{namespace}:{md5(path|query|identity)}`
pub fn build_cache_key(namespace: &str, path: &str, query: Option<&str>, identity: &str) -> String {
    let raw = format!("{}|{}|{}", path, query.unwrap_or_default(), identity);
    format!("cache:{}:{:x}", namespace, md5::compute(raw.as_bytes()))
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get_json(&self, key: &str) -> Option<Value>;
    async fn put_json(&self, key: &str, value: &Value);
    /// Invalidar todas las respuestas de un namespace
    async fn invalidate_namespace(&self, namespace: &str);
}

/// Cache respaldado por Redis
pub struct RedisResponseCache {
    client: RedisClient,
}

impl RedisResponseCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn get_json(&self, key: &str) -> Option<Value> {
        match self.client.get_raw(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("⚠️ Entrada de cache corrupta {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("⚠️ Error leyendo cache para clave {}: {}", key, e);
                None
            }
        }
    }

    async fn put_json(&self, key: &str, value: &Value) {
        let ttl = self.client.default_ttl();
        if let Err(e) = self.client.set_raw(key, &value.to_string(), ttl).await {
            warn!("⚠️ Error guardando en cache para clave {}: {}", key, e);
        }
    }

    async fn invalidate_namespace(&self, namespace: &str) {
        let pattern = format!("cache:{}:*", namespace);
        match self.client.delete_by_pattern(&pattern).await {
            Ok(count) => debug!("🧹 Cache {} invalidado ({} claves)", namespace, count),
            Err(e) => warn!("⚠️ Error invalidando cache {}: {}", namespace, e),
        }
    }
}

/// Cache deshabilitado: nunca encuentra nada
pub struct DisabledCache;

#[async_trait]
impl ResponseCache for DisabledCache {
    async fn get_json(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn put_json(&self, _key: &str, _value: &Value) {}

    async fn invalidate_namespace(&self, _namespace: &str) {}
}
