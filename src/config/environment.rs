//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub redis_url: String,
    pub cache_enabled: bool,
    pub cache_ttl_seconds: u64,
    pub email_queue_name: String,
    // Proveedor de pagos (MercadoPago); sin clave se usa modo simulación
    pub mp_key: Option<String>,
    pub frontend_url: String,
    pub backend_url: String,
}

impl EnvironmentConfig {
    /// Leer la configuración desde variables de entorno
    pub fn from_env() -> Result<Self> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment != "production" => "dev-secret-change-me".to_string(),
            Err(_) => anyhow::bail!("JWT_SECRET must be set in production"),
        };

        Ok(Self {
            port: parse_var("PORT", 3001)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", 86_400)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 20)?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            cache_enabled: parse_var("CACHE_ENABLED", true)?,
            cache_ttl_seconds: parse_var("REDIS_TTL_SECONDS", 60)?,
            email_queue_name: env::var("EMAIL_QUEUE_NAME").unwrap_or_else(|_| "email_queue".to_string()),
            mp_key: env::var("MP_KEY").ok().filter(|key| !key.is_empty()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            backend_url: env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:3001".to_string()),
            environment,
        })
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value", name)),
        Err(_) => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Configuración fija para las suites de tests
    pub fn for_tests() -> Self {
        Self {
            environment: "test".to_string(),
            port: 0,
            host: "127.0.0.1".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration: 3600,
            cors_origins: Vec::new(),
            database_url: None,
            db_max_connections: 5,
            redis_url: "redis://localhost:6379".to_string(),
            cache_enabled: false,
            cache_ttl_seconds: 60,
            email_queue_name: "email_queue".to_string(),
            mp_key: None,
            frontend_url: "http://localhost:5173".to_string(),
            backend_url: "http://localhost:3001".to_string(),
        }
    }
}
