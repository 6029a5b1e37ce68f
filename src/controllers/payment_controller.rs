use std::sync::Arc;

use uuid::Uuid;

use crate::dto::payment_dto::CreatePreferenceRequest;
use crate::dto::ApiResponse;
use crate::models::{Actor, Payment};
use crate::services::{PaymentCheckout, PaymentService, PendingPaymentView};
use crate::utils::errors::AppResult;

pub struct PaymentController {
    payments: Arc<PaymentService>,
}

impl PaymentController {
    pub fn new(payments: Arc<PaymentService>) -> Self {
        Self { payments }
    }

    pub async fn create_preference(
        &self,
        actor: &Actor,
        request: CreatePreferenceRequest,
    ) -> AppResult<ApiResponse<PaymentCheckout>> {
        let checkout = self
            .payments
            .create_preference(actor, request.repair_id, request.client_id)
            .await?;
        let message = if checkout.preference.simulation {
            "Pago simulado creado (MercadoPago no disponible)"
        } else {
            "Preferencia de pago creada exitosamente"
        };
        Ok(ApiResponse::success_with_message(checkout, message))
    }

    pub async fn pending(&self, actor: &Actor, repair_id: Uuid) -> AppResult<ApiResponse<PendingPaymentView>> {
        match self.payments.pending_for_repair(actor, repair_id).await? {
            Some(pending) => Ok(ApiResponse::success(pending)),
            None => Ok(ApiResponse::empty("No hay pagos pendientes para esta reparación")),
        }
    }

    pub async fn cancel_pending(&self, actor: &Actor, payment_id: Uuid) -> AppResult<ApiResponse<Payment>> {
        let payment = self.payments.cancel_pending(actor, payment_id).await?;
        Ok(ApiResponse::success_with_message(payment, "Pago cancelado exitosamente"))
    }

    pub async fn confirm(&self, actor: &Actor, payment_id: Uuid) -> AppResult<ApiResponse<Payment>> {
        let payment = self.payments.confirm(actor, payment_id).await?;
        Ok(ApiResponse::success_with_message(payment, "Pago confirmado"))
    }
}
