//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. El store se inyecta una sola vez y todos
//! los servicios comparten el mismo handle.

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::environment::EnvironmentConfig;
use crate::queue::JobQueue;
use crate::repositories::Store;
use crate::services::{
    DispatchMode, NotificationHub, PaymentProvider, PaymentService, QueueNotifier, WorkflowService,
};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub store: Arc<dyn Store>,
    pub workflow: Arc<WorkflowService>,
    pub payments: Arc<PaymentService>,
    pub cache: Arc<dyn ResponseCache>,
    pub queue: Arc<dyn JobQueue>,
}

/// Colaboradores externos del estado
pub struct Collaborators {
    pub store: Arc<dyn Store>,
    pub cache: Arc<dyn ResponseCache>,
    pub queue: Arc<dyn JobQueue>,
    pub provider: Arc<dyn PaymentProvider>,
    pub dispatch: DispatchMode,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            cache,
            queue,
            provider,
            dispatch,
        } = collaborators;

        let notifier = NotificationHub::new(
            Arc::new(QueueNotifier::new(Arc::clone(&store), Arc::clone(&queue))),
            dispatch,
        );
        let workflow = WorkflowService::new(Arc::clone(&store), notifier, Arc::clone(&cache));
        let payments = PaymentService::new(Arc::clone(&store), provider);

        Self {
            jwt: JwtConfig::from(&config),
            config,
            store,
            workflow: Arc::new(workflow),
            payments: Arc::new(payments),
            cache,
            queue,
        }
    }
}
