use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::car_dto::{CreateCarRequest, UpdateCarRequest};
use crate::dto::ApiResponse;
use crate::models::{Actor, Car, CarStatusChange};
use crate::services::WorkflowService;
use crate::utils::errors::AppResult;

pub struct CarController {
    workflow: Arc<WorkflowService>,
}

impl CarController {
    pub fn new(workflow: Arc<WorkflowService>) -> Self {
        Self { workflow }
    }

    pub async fn create(&self, actor: &Actor, request: CreateCarRequest) -> AppResult<ApiResponse<Car>> {
        request.validate()?;
        let car = self.workflow.register_car(actor, request.into()).await?;
        Ok(ApiResponse::success_with_message(car, "Auto registrado exitosamente"))
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, request: UpdateCarRequest) -> AppResult<ApiResponse<Car>> {
        request.validate()?;
        let car = self.workflow.update_car(actor, id, request.into()).await?;
        Ok(ApiResponse::success_with_message(car, "Auto actualizado exitosamente"))
    }

    pub async fn get_by_id(&self, actor: &Actor, id: Uuid) -> AppResult<ApiResponse<Car>> {
        let car = self.workflow.get_car(actor, id).await?;
        Ok(ApiResponse::success(car))
    }

    pub async fn list(&self, actor: &Actor) -> AppResult<ApiResponse<Vec<Car>>> {
        let cars = self.workflow.list_cars(actor).await?;
        Ok(ApiResponse::success(cars))
    }

    pub async fn list_by_client(&self, actor: &Actor, client_id: Uuid) -> AppResult<ApiResponse<Vec<Car>>> {
        let cars = self.workflow.list_client_cars(actor, client_id).await?;
        Ok(ApiResponse::success(cars))
    }

    pub async fn history(&self, actor: &Actor, id: Uuid) -> AppResult<ApiResponse<Vec<CarStatusChange>>> {
        let history = self.workflow.car_history(actor, id).await?;
        Ok(ApiResponse::success(history))
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> AppResult<ApiResponse<()>> {
        self.workflow.delete_car(actor, id).await?;
        Ok(ApiResponse::empty("Auto eliminado exitosamente"))
    }
}
