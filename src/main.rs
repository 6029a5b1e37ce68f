use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use taller_workflow::cache::redis_client::RedisClient;
use taller_workflow::cache::{CacheConfig, DisabledCache, RedisResponseCache, ResponseCache};
use taller_workflow::config::database::DatabaseConfig;
use taller_workflow::config::EnvironmentConfig;
use taller_workflow::database;
use taller_workflow::queue::{JobQueue, LogOnlyQueue, RedisJobQueue};
use taller_workflow::repositories::{MemoryStore, PgStore, Store};
use taller_workflow::services::{provider_from_config, DispatchMode, PaymentProvider};
use taller_workflow::utils::jwt::{generate_token, JwtConfig};
use taller_workflow::{create_app, AppState, Collaborators};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🔧 Taller Workflow API");
    info!("======================");

    let config = EnvironmentConfig::from_env()?;

    // Inicializar store
    let store: Arc<dyn Store> = match DatabaseConfig::for_startup(&config)? {
        Some(database) => Arc::new(PgStore::new(database::connect(&database).await?)),
        None => {
            warn!("⚠️ DATABASE_URL no configurada, usando store en memoria");
            let (store, accounts) = MemoryStore::with_demo_data().await;
            let jwt = JwtConfig::from(&config);
            for user in [
                &accounts.admin,
                &accounts.receptionist,
                &accounts.boss,
                &accounts.mechanic,
                &accounts.client,
            ] {
                info!("🔑 Token de desarrollo {} ({}): {}", user.role, user.email, generate_token(user.id, &jwt)?);
            }
            Arc::new(store)
        }
    };

    // Inicializar Redis: cache de respuestas y cola de emails
    let (cache, queue): (Arc<dyn ResponseCache>, Arc<dyn JobQueue>) =
        match RedisClient::new(CacheConfig::from(&config)).await {
            Ok(client) => {
                let cache: Arc<dyn ResponseCache> = if config.cache_enabled {
                    Arc::new(RedisResponseCache::new(client.clone()))
                } else {
                    info!("📴 Cache de respuestas deshabilitado");
                    Arc::new(DisabledCache)
                };
                let queue = RedisJobQueue::new(client, config.email_queue_name.clone());
                (cache, Arc::new(queue))
            }
            Err(e) => {
                error!("❌ Error conectando a Redis: {}", e);
                warn!("⚠️ Sin Redis: cache deshabilitado y emails descartados");
                (Arc::new(DisabledCache), Arc::new(LogOnlyQueue))
            }
        };

    let provider: Arc<dyn PaymentProvider> = Arc::from(provider_from_config(&config)?);

    let addr: SocketAddr = config.server_url().parse()?;
    let state = AppState::new(
        config,
        Collaborators {
            store,
            cache,
            queue,
            provider,
            dispatch: DispatchMode::Detached,
        },
    );
    let app = create_app(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /test - Endpoint de prueba");
    info!("🚗 /api/cars - Alta, consulta, historial y baja de autos");
    info!("🔄 /api/car-states - Estados y transiciones del auto");
    info!("📝 /api/requests - Solicitudes de servicio");
    info!("🔧 /api/repairs - Reparaciones");
    info!("💳 /api/payments - Pagos");
    info!("📨 /api/email - Email de prueba y confirmación de registro");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
