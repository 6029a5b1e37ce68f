use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::car_controller::CarController;
use crate::dto::car_dto::{CreateCarRequest, UpdateCarRequest};
use crate::dto::ApiResponse;
use crate::models::{Actor, Car, CarStatusChange};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_car_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/client/:client_id", get(list_client_cars))
        .route("/:id", get(get_car).put(update_car).delete(delete_car))
        .route("/:id/history", get(car_history))
}

async fn create_car(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateCarRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarController::new(state.workflow.clone());
    Ok(Json(controller.create(&actor, request).await?))
}

async fn list_cars(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Vec<Car>>>, AppError> {
    let controller = CarController::new(state.workflow.clone());
    Ok(Json(controller.list(&actor).await?))
}

async fn list_client_cars(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Car>>>, AppError> {
    let controller = CarController::new(state.workflow.clone());
    Ok(Json(controller.list_by_client(&actor, client_id).await?))
}

async fn get_car(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarController::new(state.workflow.clone());
    Ok(Json(controller.get_by_id(&actor, id).await?))
}

async fn update_car(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCarRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarController::new(state.workflow.clone());
    Ok(Json(controller.update(&actor, id, request).await?))
}

async fn car_history(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CarStatusChange>>>, AppError> {
    let controller = CarController::new(state.workflow.clone());
    Ok(Json(controller.history(&actor, id).await?))
}

async fn delete_car(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = CarController::new(state.workflow.clone());
    Ok(Json(controller.delete(&actor, id).await?))
}
