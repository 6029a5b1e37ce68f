use axum::{
    extract::{OriginalUri, Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use crate::cache::{build_cache_key, REPAIRS_NAMESPACE};
use crate::controllers::repair_controller::RepairController;
use crate::dto::repair_dto::{CreateRepairRequest, UpdateRepairRequest};
use crate::dto::ApiResponse;
use crate::models::{Actor, Repair, RepairSummary};
use crate::services::FinishedRepair;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_repair_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_repairs).post(create_repair))
        .route("/car/:car_id", get(list_car_repairs))
        .route("/mechanic/:mechanic_id", get(list_mechanic_repairs))
        .route("/:id", get(get_repair).put(update_repair).delete(delete_repair))
}

/// Listado con cache read-through por ruta, query e identidad
async fn list_repairs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Value>, AppError> {
    let key = build_cache_key(
        REPAIRS_NAMESPACE,
        uri.path(),
        uri.query(),
        &actor.user_id.to_string(),
    );
    if let Some(cached) = state.cache.get_json(&key).await {
        return Ok(Json(cached));
    }

    let controller = RepairController::new(state.workflow.clone());
    let response = controller.list(&actor).await?;
    let value = serde_json::to_value(&response)
        .map_err(|e| AppError::Internal(format!("Error serializando reparaciones: {}", e)))?;
    state.cache.put_json(&key, &value).await;
    Ok(Json(value))
}

async fn list_car_repairs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(car_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RepairSummary>>>, AppError> {
    let controller = RepairController::new(state.workflow.clone());
    Ok(Json(controller.list_by_car(&actor, car_id).await?))
}

async fn list_mechanic_repairs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(mechanic_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RepairSummary>>>, AppError> {
    let controller = RepairController::new(state.workflow.clone());
    Ok(Json(controller.list_by_mechanic(&actor, mechanic_id).await?))
}

async fn create_repair(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateRepairRequest>,
) -> Result<Json<ApiResponse<FinishedRepair>>, AppError> {
    let controller = RepairController::new(state.workflow.clone());
    Ok(Json(controller.create(&actor, request).await?))
}

async fn update_repair(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRepairRequest>,
) -> Result<Json<ApiResponse<Repair>>, AppError> {
    let controller = RepairController::new(state.workflow.clone());
    Ok(Json(controller.update(&actor, id, request).await?))
}

async fn get_repair(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Repair>>, AppError> {
    let controller = RepairController::new(state.workflow.clone());
    Ok(Json(controller.get_by_id(&actor, id).await?))
}

async fn delete_repair(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = RepairController::new(state.workflow.clone());
    Ok(Json(controller.delete(&actor, id).await?))
}
