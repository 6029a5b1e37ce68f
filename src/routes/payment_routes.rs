use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::payment_controller::PaymentController;
use crate::dto::payment_dto::CreatePreferenceRequest;
use crate::dto::ApiResponse;
use crate::models::{Actor, Payment};
use crate::services::{PaymentCheckout, PendingPaymentView};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_payment_router() -> Router<AppState> {
    Router::new()
        .route("/create-preference", post(create_preference))
        .route("/pending/:repair_id", get(pending_payment))
        .route("/cancel-pending/:payment_id", post(cancel_pending))
        .route("/:payment_id/confirm", post(confirm_payment))
}

async fn create_preference(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreatePreferenceRequest>,
) -> Result<Json<ApiResponse<PaymentCheckout>>, AppError> {
    let controller = PaymentController::new(state.payments.clone());
    Ok(Json(controller.create_preference(&actor, request).await?))
}

async fn pending_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(repair_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PendingPaymentView>>, AppError> {
    let controller = PaymentController::new(state.payments.clone());
    Ok(Json(controller.pending(&actor, repair_id).await?))
}

async fn cancel_pending(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let controller = PaymentController::new(state.payments.clone());
    Ok(Json(controller.cancel_pending(&actor, payment_id).await?))
}

async fn confirm_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let controller = PaymentController::new(state.payments.clone());
    Ok(Json(controller.confirm(&actor, payment_id).await?))
}
