//! Modelo de Payment
//!
//! Pago asociado a una reparación. Como máximo un pago PENDIENTE por
//! reparación.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::status::PaymentStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub status: PaymentStatus,
    pub external_reference: Option<String>,
    pub repair_id: Uuid,
    pub client_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Pago a registrar en estado PENDIENTE
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Decimal,
    pub method: String,
    pub external_reference: Option<String>,
    pub repair_id: Uuid,
    pub client_id: Uuid,
}

impl NewPayment {
    pub fn into_payment(self, now: DateTime<Utc>) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            amount: self.amount,
            method: self.method,
            status: PaymentStatus::Pendiente,
            external_reference: self.external_reference,
            repair_id: self.repair_id,
            client_id: self.client_id,
            created_at: now,
        }
    }
}
