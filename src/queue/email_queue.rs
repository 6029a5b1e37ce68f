//! Cola de emails
//!
//! Jobs tipados `{ "type": ..., "payload": ... }` que se encolan en una lista
//! durable de Redis. El consumo queda a cargo de un worker externo.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::redis_client::RedisClient;
use crate::models::{Car, ClientContact, StatusRef};

/// Datos del auto que viajan en las notificaciones
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarNotice {
    pub id: Uuid,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub status: StatusRef,
    pub client: ClientContact,
}

impl CarNotice {
    pub fn new(car: &Car, client: ClientContact) -> Self {
        Self {
            id: car.id,
            license_plate: car.license_plate.clone(),
            brand: car.brand.clone(),
            model: car.model.clone(),
            status: StatusRef::from(car.status),
            client,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetNotice {
    pub description: String,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum EmailJob {
    #[serde(rename_all = "camelCase")]
    TestEmail { email: String },
    #[serde(rename_all = "camelCase")]
    RegistrationConfirmation {
        email: String,
        name: String,
        login_date_time: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    CarStateChange {
        car_data: CarNotice,
        previous_state: Option<StatusRef>,
    },
    #[serde(rename_all = "camelCase")]
    BudgetEmail {
        car_data: CarNotice,
        budget_data: BudgetNotice,
    },
}

impl EmailJob {
    pub fn kind(&self) -> &'static str {
        match self {
            EmailJob::TestEmail { .. } => "testEmail",
            EmailJob::RegistrationConfirmation { .. } => "registrationConfirmation",
            EmailJob::CarStateChange { .. } => "carStateChange",
            EmailJob::BudgetEmail { .. } => "budgetEmail",
        }
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: EmailJob) -> Result<()>;
}

/// Cola sobre una lista de Redis (RPUSH)
pub struct RedisJobQueue {
    client: RedisClient,
    queue_name: String,
}

impl RedisJobQueue {
    pub fn new(client: RedisClient, queue_name: impl Into<String>) -> Self {
        Self {
            client,
            queue_name: queue_name.into(),
        }
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: EmailJob) -> Result<()> {
        let payload = serde_json::to_string(&job)?;
        let length = self.client.rpush(&self.queue_name, &payload).await?;
        debug!("📨 Job {} encolado en {} (pendientes: {})", job.kind(), self.queue_name, length);
        Ok(())
    }
}

/// Cola sin backend: registra el job y lo descarta
pub struct LogOnlyQueue;

#[async_trait]
impl JobQueue for LogOnlyQueue {
    async fn enqueue(&self, job: EmailJob) -> Result<()> {
        info!("📭 Cola de emails deshabilitada, job {} descartado", job.kind());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CarStatus;
    use serde_json::json;

    #[test]
    fn test_job_wire_format() {
        let job = EmailJob::TestEmail {
            email: "admin@taller.com".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            json!({ "type": "testEmail", "payload": { "email": "admin@taller.com" } })
        );
    }

    #[test]
    fn test_registration_confirmation_wire_format() {
        let login_date_time = Utc::now();
        let job = EmailJob::RegistrationConfirmation {
            email: "ana@mail.com".to_string(),
            name: "Ana".to_string(),
            login_date_time,
        };
        assert_eq!(job.kind(), "registrationConfirmation");

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "registrationConfirmation");
        assert_eq!(value["payload"]["name"], "Ana");
        assert_eq!(value["payload"]["loginDateTime"], json!(login_date_time));
    }

    #[test]
    fn test_state_change_payload_uses_camel_case() {
        let job = EmailJob::CarStateChange {
            car_data: CarNotice {
                id: Uuid::nil(),
                license_plate: "ABC123".to_string(),
                brand: "Fiat".to_string(),
                model: "Cronos".to_string(),
                status: StatusRef::from(CarStatus::EnRevision),
                client: ClientContact {
                    client_id: Uuid::nil(),
                    name: "Ana".to_string(),
                    last_name: "Pérez".to_string(),
                    email: Some("ana@mail.com".to_string()),
                },
            },
            previous_state: Some(StatusRef { id: 2, name: "Pendiente" }),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "carStateChange");
        assert_eq!(value["payload"]["carData"]["licensePlate"], "ABC123");
        assert_eq!(value["payload"]["carData"]["client"]["lastName"], "Pérez");
        assert_eq!(value["payload"]["previousState"]["id"], 2);
    }
}
