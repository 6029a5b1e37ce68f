//! Notificaciones
//!
//! Después de cada cambio de estado confirmado se encola un email para el
//! dueño del auto. El envío es at-most-once y sin reintentos: un error se
//! registra y nunca deshace ni hace fallar la transición.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

use crate::models::{Car, CarStatus, StatusRef};
use crate::queue::{BudgetNotice, CarNotice, EmailJob, JobQueue};
use crate::repositories::Store;
use crate::workflow::request_machine::BudgetDraft;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_car_state_change(&self, car: &Car, previous: Option<CarStatus>) -> Result<()>;
    async fn send_budget_email(&self, car: &Car, budget: &BudgetDraft) -> Result<()>;
}

/// Dispatcher que resuelve el contacto del dueño y encola el job
pub struct QueueNotifier {
    store: Arc<dyn Store>,
    queue: Arc<dyn JobQueue>,
}

impl QueueNotifier {
    pub fn new(store: Arc<dyn Store>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    /// `None` cuando el dueño no tiene email
    async fn notice_for(&self, car: &Car) -> Result<Option<CarNotice>> {
        let contact = self.store.find_client_contact(car.client_id).await?;
        match contact {
            Some(contact) if contact.email.is_some() => Ok(Some(CarNotice::new(car, contact))),
            _ => {
                debug!("📭 Auto {} sin email de contacto, no se notifica", car.license_plate);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl NotificationDispatcher for QueueNotifier {
    async fn send_car_state_change(&self, car: &Car, previous: Option<CarStatus>) -> Result<()> {
        let Some(car_data) = self.notice_for(car).await? else {
            return Ok(());
        };
        self.queue
            .enqueue(EmailJob::CarStateChange {
                car_data,
                previous_state: previous.map(StatusRef::from),
            })
            .await
    }

    async fn send_budget_email(&self, car: &Car, budget: &BudgetDraft) -> Result<()> {
        let Some(car_data) = self.notice_for(car).await? else {
            return Ok(());
        };
        self.queue
            .enqueue(EmailJob::BudgetEmail {
                car_data,
                budget_data: BudgetNotice {
                    description: budget.description.clone(),
                    cost: budget.cost,
                },
            })
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Tarea separada; la respuesta HTTP no la espera
    Detached,
    /// Se espera el envío (tests)
    Inline,
}

/// Punto único por el que los servicios disparan notificaciones
#[derive(Clone)]
pub struct NotificationHub {
    dispatcher: Arc<dyn NotificationDispatcher>,
    mode: DispatchMode,
}

impl NotificationHub {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>, mode: DispatchMode) -> Self {
        Self { dispatcher, mode }
    }

    pub async fn car_state_changed(&self, car: Car, previous: Option<CarStatus>) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let send = async move {
            if let Err(e) = dispatcher.send_car_state_change(&car, previous).await {
                warn!("⚠️ No se pudo notificar el cambio de estado del auto {}: {}", car.license_plate, e);
            }
        };
        self.run(send).await;
    }

    pub async fn budget_sent(&self, car: Car, budget: BudgetDraft) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let send = async move {
            if let Err(e) = dispatcher.send_budget_email(&car, &budget).await {
                warn!("⚠️ No se pudo enviar el presupuesto del auto {}: {}", car.license_plate, e);
            }
        };
        self.run(send).await;
    }

    async fn run<F>(&self, send: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match self.mode {
            DispatchMode::Detached => {
                tokio::spawn(send);
            }
            DispatchMode::Inline => send.await,
        }
    }
}
