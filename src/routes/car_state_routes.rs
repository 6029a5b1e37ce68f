use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::car_state_controller::CarStateController;
use crate::dto::car_dto::{CarActionRequest, CarTransitionRequest, FinishRepairRequest};
use crate::dto::ApiResponse;
use crate::models::{Actor, Car, CarStatusEntry};
use crate::services::{FinishedRepair, RequestOutcome};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_car_state_router() -> Router<AppState> {
    Router::new()
        .route("/statuses", get(list_statuses))
        .route("/transition", post(transition))
        .route("/accept-budget", post(accept_budget))
        .route("/reject-budget", post(reject_budget))
        .route("/finish-repair", post(finish_repair))
        .route("/deliver-car", post(deliver_car))
}

async fn list_statuses() -> Json<ApiResponse<Vec<CarStatusEntry>>> {
    Json(CarStateController::statuses())
}

async fn transition(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CarTransitionRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarStateController::new(state.workflow.clone());
    Ok(Json(controller.transition(&actor, request).await?))
}

async fn accept_budget(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CarActionRequest>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let controller = CarStateController::new(state.workflow.clone());
    Ok(Json(controller.accept_budget(&actor, request).await?))
}

async fn reject_budget(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CarActionRequest>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let controller = CarStateController::new(state.workflow.clone());
    Ok(Json(controller.reject_budget(&actor, request).await?))
}

async fn finish_repair(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<FinishRepairRequest>,
) -> Result<Json<ApiResponse<FinishedRepair>>, AppError> {
    let controller = CarStateController::new(state.workflow.clone());
    Ok(Json(controller.finish_repair(&actor, request).await?))
}

async fn deliver_car(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CarActionRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarStateController::new(state.workflow.clone());
    Ok(Json(controller.deliver(&actor, request).await?))
}
