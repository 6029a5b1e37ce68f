//! Política de pagos pendientes
//!
//! Como máximo un pago PENDIENTE por reparación. Un pendiente con 30 minutos
//! o más se cancela automáticamente cuando llega un nuevo intento de pago;
//! no hay barrido en segundo plano.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::payment::Payment;
use crate::models::status::PaymentStatus;
use crate::utils::errors::{invalid_input_error, invalid_state_error, AppResult, PendingPaymentConflict};

pub const PENDING_PAYMENT_TTL_MINUTES: i64 = 30;

pub fn pending_ttl() -> Duration {
    Duration::minutes(PENDING_PAYMENT_TTL_MINUTES)
}

/// Qué hacer ante un nuevo intento de pago
#[derive(Debug, Clone, PartialEq)]
pub enum PendingDecision {
    Create,
    ExpireThenCreate { expired_payment_id: Uuid },
    Reject(PendingPaymentConflict),
}

/// Momento a partir del cual el pendiente puede reemplazarse
pub fn replaceable_after(payment: &Payment) -> DateTime<Utc> {
    payment.created_at + pending_ttl()
}

pub fn conflict_for(payment: &Payment) -> PendingPaymentConflict {
    PendingPaymentConflict {
        existing_payment_id: payment.id,
        created_at: payment.created_at,
        can_cancel_after: replaceable_after(payment),
    }
}

/// Minutos (redondeados hacia arriba) hasta que el pendiente expire
pub fn minutes_left(payment: &Payment, now: DateTime<Utc>) -> i64 {
    let remaining = replaceable_after(payment) - now;
    if remaining <= Duration::zero() {
        return 0;
    }
    let seconds = remaining.num_seconds();
    (seconds + 59) / 60
}

pub fn evaluate(existing: Option<&Payment>, now: DateTime<Utc>) -> PendingDecision {
    match existing {
        None => PendingDecision::Create,
        Some(payment) if payment.status != PaymentStatus::Pendiente => PendingDecision::Create,
        Some(payment) if now - payment.created_at >= pending_ttl() => {
            PendingDecision::ExpireThenCreate {
                expired_payment_id: payment.id,
            }
        }
        Some(payment) => PendingDecision::Reject(conflict_for(payment)),
    }
}

/// La cancelación manual se permite en cualquier momento, sólo sobre pendientes
pub fn ensure_cancellable(payment: &Payment) -> AppResult<()> {
    if payment.status != PaymentStatus::Pendiente {
        return Err(invalid_state_error(format!(
            "Solo se pueden cancelar pagos pendientes (estado actual: {})",
            payment.status
        )));
    }
    Ok(())
}

pub fn ensure_confirmable(payment: &Payment) -> AppResult<()> {
    if payment.status != PaymentStatus::Pendiente {
        return Err(invalid_state_error(format!(
            "Solo se pueden confirmar pagos pendientes (estado actual: {})",
            payment.status
        )));
    }
    Ok(())
}

/// Una reparación sin costo no genera pago
pub fn ensure_payable_amount(cost: Decimal) -> AppResult<Decimal> {
    if cost <= Decimal::ZERO {
        return Err(invalid_input_error(
            "Costo de reparación inválido para procesar el pago",
        ));
    }
    Ok(cost)
}
