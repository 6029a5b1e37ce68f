//! Conexión a PostgreSQL
//!
//! Crea el pool, verifica la conexión y aplica el esquema de referencia.

use anyhow::{Context, Result};
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::database::DatabaseConfig;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Crear el pool y dejar el esquema listo
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    info!(
        "🔗 Conectando a PostgreSQL: {} (pool {})",
        mask_database_url(&config.url),
        config.max_connections
    );

    let pool = config
        .create_pool()
        .await
        .context("no se pudo crear el pool de PostgreSQL")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("PostgreSQL no responde")?;

    run_migrations(&pool).await?;
    info!("✅ PostgreSQL conectado");
    Ok(pool)
}

/// Aplicar el esquema (idempotente: todas las sentencias usan IF NOT EXISTS)
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    pool.execute(SCHEMA)
        .await
        .context("error aplicando sql/schema.sql")?;
    Ok(())
}

/// Enmascarar usuario y contraseña de la URL para los logs
pub fn mask_database_url(url: &str) -> String {
    let Some(at_pos) = url.rfind('@') else {
        return url.to_string();
    };
    let scheme_end = url.find("://").map(|pos| pos + 3).unwrap_or(0);
    if scheme_end > at_pos {
        return url.to_string();
    }
    format!("{}***:***@{}", &url[..scheme_end], &url[at_pos + 1..])
}
