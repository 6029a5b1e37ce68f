use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::request_controller::RequestController;
use crate::dto::request_dto::{
    AssignMechanicRequest, CreateServiceRequest, SendBudgetRequest, UpdateRequestStatusRequest,
};
use crate::dto::ApiResponse;
use crate::models::Actor;
use crate::services::{RequestDetail, RequestOutcome};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_request_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request))
        .route("/boss/:boss_id", get(list_boss_requests))
        .route("/mechanic/:mechanic_id", get(list_mechanic_requests))
        .route("/client/:client_id", get(list_client_requests))
        .route("/:id/assign", put(assign_mechanic))
        .route("/:id/status", put(update_status))
        .route("/:id/budget", post(send_budget))
        .route("/:id/cancel", post(cancel_request))
}

async fn create_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let controller = RequestController::new(state.workflow.clone());
    Ok(Json(controller.create(&actor, request).await?))
}

async fn assign_mechanic(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignMechanicRequest>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let controller = RequestController::new(state.workflow.clone());
    Ok(Json(controller.assign(&actor, id, request).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRequestStatusRequest>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let controller = RequestController::new(state.workflow.clone());
    Ok(Json(controller.update_status(&actor, id, request).await?))
}

async fn send_budget(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendBudgetRequest>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let controller = RequestController::new(state.workflow.clone());
    Ok(Json(controller.send_budget(&actor, id, request).await?))
}

async fn cancel_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let controller = RequestController::new(state.workflow.clone());
    Ok(Json(controller.cancel(&actor, id).await?))
}

async fn list_boss_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(boss_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RequestDetail>>>, AppError> {
    let controller = RequestController::new(state.workflow.clone());
    Ok(Json(controller.list_by_boss(&actor, boss_id).await?))
}

async fn list_mechanic_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(mechanic_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RequestDetail>>>, AppError> {
    let controller = RequestController::new(state.workflow.clone());
    Ok(Json(controller.list_by_mechanic(&actor, mechanic_id).await?))
}

async fn list_client_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RequestDetail>>>, AppError> {
    let controller = RequestController::new(state.workflow.clone());
    Ok(Json(controller.list_by_client(&actor, client_id).await?))
}
