use std::sync::Arc;

use validator::Validate;

use crate::dto::car_dto::{CarActionRequest, CarTransitionRequest, FinishRepairRequest};
use crate::dto::ApiResponse;
use crate::models::{car_status_registry, Actor, Car, CarStatusEntry};
use crate::services::{FinishedRepair, RequestOutcome, WorkflowService};
use crate::utils::errors::AppResult;

pub struct CarStateController {
    workflow: Arc<WorkflowService>,
}

impl CarStateController {
    pub fn new(workflow: Arc<WorkflowService>) -> Self {
        Self { workflow }
    }

    pub fn statuses() -> ApiResponse<Vec<CarStatusEntry>> {
        ApiResponse::success(car_status_registry())
    }

    pub async fn transition(&self, actor: &Actor, request: CarTransitionRequest) -> AppResult<ApiResponse<Car>> {
        request.validate()?;
        let car = self
            .workflow
            .manual_transition(actor, request.car_id, request.new_status_id, request.description)
            .await?;
        let message = format!("Estado cambiado a {}", car.status);
        Ok(ApiResponse::success_with_message(car, message))
    }

    pub async fn accept_budget(&self, actor: &Actor, request: CarActionRequest) -> AppResult<ApiResponse<RequestOutcome>> {
        let outcome = self.workflow.accept_budget(actor, request.car_id).await?;
        Ok(ApiResponse::success_with_message(
            outcome,
            "Presupuesto aceptado. El auto pasa a reparación",
        ))
    }

    pub async fn reject_budget(&self, actor: &Actor, request: CarActionRequest) -> AppResult<ApiResponse<RequestOutcome>> {
        let outcome = self.workflow.reject_budget(actor, request.car_id).await?;
        Ok(ApiResponse::success_with_message(
            outcome,
            "Presupuesto rechazado. El auto vuelve a Entrada",
        ))
    }

    pub async fn finish_repair(&self, actor: &Actor, request: FinishRepairRequest) -> AppResult<ApiResponse<FinishedRepair>> {
        request.validate()?;
        let finished = self
            .workflow
            .finish_repair(actor, request.car_id, &request.final_description, request.final_cost)
            .await?;
        Ok(ApiResponse::success_with_message(finished, "Reparación finalizada"))
    }

    pub async fn deliver(&self, actor: &Actor, request: CarActionRequest) -> AppResult<ApiResponse<Car>> {
        let car = self.workflow.deliver_car(actor, request.car_id).await?;
        Ok(ApiResponse::success_with_message(car, "Auto entregado exitosamente"))
    }
}
