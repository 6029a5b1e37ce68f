//! Pool de PostgreSQL
//!
//! Tamaños y timeouts del pool de SQLx, derivados de `EnvironmentConfig`.

use anyhow::{bail, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::environment::EnvironmentConfig;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    /// `None` cuando no hay `DATABASE_URL` (se usa el store en memoria)
    pub fn from_env_config(config: &EnvironmentConfig) -> Option<Self> {
        let url = config.database_url.clone()?;
        let max_connections = config.db_max_connections.max(1);
        Some(Self {
            url,
            max_connections,
            min_connections: max_connections.min(2),
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(300),
        })
    }

    /// Igual que `from_env_config`, pero en producción la base es obligatoria:
    /// el store en memoria con datos de demo nunca se levanta ahí
    pub fn for_startup(config: &EnvironmentConfig) -> Result<Option<Self>> {
        match Self::from_env_config(config) {
            None if config.is_production() => {
                bail!("DATABASE_URL es obligatoria con ENVIRONMENT=production")
            }
            database => Ok(database),
        }
    }

    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .connect(&self.url)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_url_means_no_pool() {
        assert!(DatabaseConfig::from_env_config(&EnvironmentConfig::for_tests()).is_none());
    }

    #[test]
    fn test_production_requires_database_url() {
        let mut config = EnvironmentConfig::for_tests();
        config.environment = "production".to_string();
        assert!(DatabaseConfig::for_startup(&config).is_err());

        config.database_url = Some("postgresql://localhost/taller".to_string());
        assert!(DatabaseConfig::for_startup(&config).unwrap().is_some());
    }

    #[test]
    fn test_development_falls_back_to_memory_store() {
        assert!(DatabaseConfig::for_startup(&EnvironmentConfig::for_tests())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_pool_size_follows_environment() {
        let mut config = EnvironmentConfig::for_tests();
        config.database_url = Some("postgresql://localhost/taller".to_string());
        config.db_max_connections = 1;

        let database = DatabaseConfig::from_env_config(&config).unwrap();
        assert_eq!(database.max_connections, 1);
        assert_eq!(database.min_connections, 1);
    }
}
