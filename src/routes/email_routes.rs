use axum::{extract::State, routing::post, Extension, Json, Router};
use serde_json::Value;

use crate::controllers::email_controller::EmailController;
use crate::dto::email_dto::{RegistrationConfirmationRequest, TestEmailRequest};
use crate::dto::ApiResponse;
use crate::models::Actor;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_email_router() -> Router<AppState> {
    Router::new()
        .route("/test", post(send_test_email))
        .route("/registration-confirmation", post(send_registration_confirmation))
}

async fn send_test_email(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<TestEmailRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let controller = EmailController::new(state.queue.clone());
    Ok(Json(controller.send_test(&actor, request).await?))
}

async fn send_registration_confirmation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<RegistrationConfirmationRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let controller = EmailController::new(state.queue.clone());
    Ok(Json(controller.send_registration_confirmation(&actor, request).await?))
}
