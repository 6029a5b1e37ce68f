//! Servicio de pagos
//!
//! Inicio de pagos de reparaciones con la política de un único pendiente por
//! reparación y expiración perezosa a los 30 minutos.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::payment_provider::{PaymentProvider, Preference, PreferenceOrder};
use crate::models::{Actor, NewPayment, Payment, PaymentStatus};
use crate::repositories::{PendingInsert, Store};
use crate::utils::errors::{invalid_input_error, not_found_error, AppError, AppResult};
use crate::workflow::authorization::{self, require};
use crate::workflow::payment_policy::{self, PendingDecision};
use crate::workflow::roles::ADMIN;

/// Pago registrado junto con la preferencia del proveedor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCheckout {
    pub payment: Payment,
    #[serde(flatten)]
    pub preference: Preference,
}

/// Pago pendiente con su ventana de reemplazo
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPaymentView {
    #[serde(flatten)]
    pub payment: Payment,
    pub can_replace_now: bool,
    pub can_replace_after: DateTime<Utc>,
    pub minutes_left: i64,
}

pub struct PaymentService {
    store: Arc<dyn Store>,
    provider: Arc<dyn PaymentProvider>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn Store>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { store, provider }
    }

    async fn load_payment(&self, payment_id: Uuid) -> AppResult<Payment> {
        self.store
            .find_payment(payment_id)
            .await?
            .ok_or_else(|| not_found_error("Pago", payment_id))
    }

    pub async fn create_preference(
        &self,
        actor: &Actor,
        repair_id: Uuid,
        client_id: Uuid,
    ) -> AppResult<PaymentCheckout> {
        self.create_preference_at(actor, repair_id, client_id, Utc::now())
            .await
    }

    /// Iniciar el pago de una reparación en el instante `now`
    pub async fn create_preference_at(
        &self,
        actor: &Actor,
        repair_id: Uuid,
        client_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<PaymentCheckout> {
        authorization::ensure_can_handle_payment(actor, client_id)?;

        let repair = self
            .store
            .find_repair(repair_id)
            .await?
            .ok_or_else(|| not_found_error("Reparación", repair_id))?;
        let car = self
            .store
            .find_car(repair.car_id)
            .await?
            .ok_or_else(|| not_found_error("Auto", repair.car_id))?;
        if car.client_id != client_id {
            return Err(AppError::Forbidden(
                "No tienes permiso para pagar esta reparación".to_string(),
            ));
        }
        let amount = payment_policy::ensure_payable_amount(repair.cost)?;

        let existing = self.store.find_pending_payment(repair_id).await?;
        match payment_policy::evaluate(existing.as_ref(), now) {
            PendingDecision::Create => {}
            PendingDecision::ExpireThenCreate { expired_payment_id } => {
                let expired = self
                    .store
                    .update_payment_status(
                        expired_payment_id,
                        PaymentStatus::Pendiente,
                        PaymentStatus::Cancelado,
                    )
                    .await?;
                if expired.is_some() {
                    info!("⏱️ Pago pendiente {} cancelado por expiración", expired_payment_id);
                }
            }
            PendingDecision::Reject(conflict) => {
                warn!(
                    "⚠️ Reparación {} ya tiene el pago pendiente {}",
                    repair_id, conflict.existing_payment_id
                );
                return Err(AppError::DuplicatePendingPayment(conflict));
            }
        }

        let contact = self
            .store
            .find_client_contact(client_id)
            .await?
            .ok_or_else(|| not_found_error("Cliente", client_id))?;
        if contact.name.trim().is_empty() || contact.last_name.trim().is_empty() {
            return Err(invalid_input_error(
                "Información de usuario incompleta: nombre y apellido son requeridos",
            ));
        }

        let order = PreferenceOrder {
            repair_id,
            client_id,
            description: repair.description.clone(),
            amount,
            brand: car.brand.clone(),
            model: car.model.clone(),
            license_plate: car.license_plate.clone(),
            payer_name: contact.name,
            payer_surname: contact.last_name,
            payer_email: contact.email,
            requested_at: now,
        };
        let preference = self.provider.create_preference(&order).await?;

        let new_payment = NewPayment {
            amount,
            method: preference.method.to_string(),
            external_reference: Some(preference.external_id.clone()),
            repair_id,
            client_id,
        };
        match self.store.insert_pending_payment(new_payment, now).await? {
            PendingInsert::Created(payment) => {
                info!(
                    "💳 Pago {} pendiente para reparación {} ({})",
                    payment.id, repair_id, payment.method
                );
                Ok(PaymentCheckout {
                    payment,
                    preference,
                })
            }
            PendingInsert::AlreadyPending(existing) => {
                warn!(
                    "⚠️ Carrera perdida: la reparación {} ya tiene el pago pendiente {}",
                    repair_id, existing.id
                );
                Err(AppError::DuplicatePendingPayment(
                    payment_policy::conflict_for(&existing),
                ))
            }
        }
    }

    pub async fn pending_for_repair(
        &self,
        actor: &Actor,
        repair_id: Uuid,
    ) -> AppResult<Option<PendingPaymentView>> {
        self.pending_for_repair_at(actor, repair_id, Utc::now()).await
    }

    /// Pago pendiente de una reparación, visible para el dueño o un admin
    pub async fn pending_for_repair_at(
        &self,
        actor: &Actor,
        repair_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PendingPaymentView>> {
        let Some(payment) = self.store.find_pending_payment(repair_id).await? else {
            return Ok(None);
        };
        authorization::ensure_owner_or_admin(actor, payment.client_id, "ver este pago")?;

        let can_replace_after = payment_policy::replaceable_after(&payment);
        let minutes_left = payment_policy::minutes_left(&payment, now);
        Ok(Some(PendingPaymentView {
            payment,
            can_replace_now: now >= can_replace_after,
            can_replace_after,
            minutes_left,
        }))
    }

    /// Cancelación manual, permitida en cualquier momento
    pub async fn cancel_pending(&self, actor: &Actor, payment_id: Uuid) -> AppResult<Payment> {
        let payment = self.load_payment(payment_id).await?;
        authorization::ensure_owner_or_admin(actor, payment.client_id, "cancelar este pago")?;
        payment_policy::ensure_cancellable(&payment)?;

        let cancelled = self
            .store
            .update_payment_status(payment_id, PaymentStatus::Pendiente, PaymentStatus::Cancelado)
            .await?
            .ok_or_else(|| crate::repositories::stale_state_error("el pago"))?;
        info!("🚫 Pago {} cancelado", payment_id);
        Ok(cancelled)
    }

    /// Confirmación manual por un admin
    pub async fn confirm(&self, actor: &Actor, payment_id: Uuid) -> AppResult<Payment> {
        require(actor, ADMIN)?;
        let payment = self.load_payment(payment_id).await?;
        payment_policy::ensure_confirmable(&payment)?;

        let paid = self
            .store
            .update_payment_status(payment_id, PaymentStatus::Pendiente, PaymentStatus::Pagado)
            .await?
            .ok_or_else(|| crate::repositories::stale_state_error("el pago"))?;
        info!("✅ Pago {} confirmado", payment_id);
        Ok(paid)
    }
}
