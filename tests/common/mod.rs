//! Utilidades compartidas por los tests de integración

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use taller_workflow::cache::ResponseCache;
use taller_workflow::config::EnvironmentConfig;
use taller_workflow::models::{Actor, Car, NewCar, UserAccount};
use taller_workflow::queue::{EmailJob, JobQueue};
use taller_workflow::repositories::MemoryStore;
use taller_workflow::services::payment_provider::SimulatedProvider;
use taller_workflow::services::DispatchMode;
use taller_workflow::{AppState, Collaborators};

/// Cola que guarda los jobs en memoria
#[derive(Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<EmailJob>>,
}

impl RecordingQueue {
    pub async fn kinds(&self) -> Vec<&'static str> {
        self.jobs.lock().await.iter().map(EmailJob::kind).collect()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: EmailJob) -> anyhow::Result<()> {
        self.jobs.lock().await.push(job);
        Ok(())
    }
}

/// Cache en memoria que registra las invalidaciones
#[derive(Default)]
pub struct RecordingCache {
    pub entries: Mutex<HashMap<String, Value>>,
    pub invalidated: Mutex<Vec<String>>,
}

#[async_trait]
impl ResponseCache for RecordingCache {
    async fn get_json(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn put_json(&self, key: &str, value: &Value) {
        self.entries.lock().await.insert(key.to_string(), value.clone());
    }

    async fn invalidate_namespace(&self, namespace: &str) {
        let prefix = format!("cache:{}:", namespace);
        self.entries.lock().await.retain(|key, _| !key.starts_with(&prefix));
        self.invalidated.lock().await.push(namespace.to_string());
    }
}

/// Taller de prueba: un usuario por rol, un jefe con su mecánico y un
/// cliente con email
pub struct Workshop {
    pub store: Arc<MemoryStore>,
    pub queue: Arc<RecordingQueue>,
    pub cache: Arc<RecordingCache>,
    pub state: AppState,
    pub admin: UserAccount,
    pub receptionist: UserAccount,
    pub boss: UserAccount,
    pub mechanic: UserAccount,
    pub client: UserAccount,
    pub other_client: UserAccount,
}

impl Workshop {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let admin = store.add_staff("Admin", "Taller", "admin@taller.com", "Admin").await;
        let receptionist = store
            .add_staff("Rita", "Recepción", "rita@taller.com", "Recepcionista")
            .await;
        let (boss, boss_profile) = store.add_boss("Jorge", "Jefe", "jorge@taller.com").await;
        let (mechanic, _) = store
            .add_mechanic("Mario", "Mecánico", "mario@taller.com", Some(boss_profile.id))
            .await;
        let (client, _) = store.add_client("Ana", "Pérez", Some("ana@mail.com")).await;
        let (other_client, _) = store.add_client("Luis", "Gómez", Some("luis@mail.com")).await;

        let queue = Arc::new(RecordingQueue::default());
        let cache = Arc::new(RecordingCache::default());
        let state = AppState::new(
            EnvironmentConfig::for_tests(),
            Collaborators {
                store: store.clone(),
                cache: cache.clone(),
                queue: queue.clone(),
                provider: Arc::new(SimulatedProvider::new("http://localhost:5173")),
                dispatch: DispatchMode::Inline,
            },
        );

        Self {
            store,
            queue,
            cache,
            state,
            admin,
            receptionist,
            boss,
            mechanic,
            client,
            other_client,
        }
    }

    pub fn actor(user: &UserAccount) -> Actor {
        Actor::from(user)
    }

    pub fn client_id(&self) -> Uuid {
        self.client.client_id.expect("cliente con perfil")
    }

    pub fn mechanic_id(&self) -> Uuid {
        self.mechanic.mechanic_id.expect("mecánico con perfil")
    }

    pub fn boss_id(&self) -> Uuid {
        self.boss.boss_id.expect("jefe con perfil")
    }

    /// Alta de un auto del cliente principal
    pub async fn register_car(&self, plate: &str) -> Car {
        self.state
            .workflow
            .register_car(
                &Self::actor(&self.client),
                NewCar {
                    license_plate: plate.to_string(),
                    brand: "Fiat".to_string(),
                    model: "Cronos".to_string(),
                    kms: 42_000,
                    chassis: "8AP359AFJ12345678".to_string(),
                    description: None,
                    priority: 0,
                    client_id: self.client_id(),
                },
            )
            .await
            .expect("alta de auto")
    }
}
