use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::repair_dto::{CreateRepairRequest, UpdateRepairRequest};
use crate::dto::ApiResponse;
use crate::models::{Actor, Repair, RepairSummary};
use crate::services::{FinishedRepair, WorkflowService};
use crate::utils::errors::AppResult;

pub struct RepairController {
    workflow: Arc<WorkflowService>,
}

impl RepairController {
    pub fn new(workflow: Arc<WorkflowService>) -> Self {
        Self { workflow }
    }

    pub async fn list(&self, actor: &Actor) -> AppResult<ApiResponse<Vec<RepairSummary>>> {
        let repairs = self.workflow.list_repairs(actor).await?;
        Ok(ApiResponse::success(repairs))
    }

    pub async fn get_by_id(&self, actor: &Actor, id: Uuid) -> AppResult<ApiResponse<Repair>> {
        let repair = self.workflow.get_repair(actor, id).await?;
        Ok(ApiResponse::success(repair))
    }

    pub async fn list_by_car(&self, actor: &Actor, car_id: Uuid) -> AppResult<ApiResponse<Vec<RepairSummary>>> {
        let repairs = self.workflow.car_repairs(actor, car_id).await?;
        Ok(ApiResponse::success(repairs))
    }

    pub async fn list_by_mechanic(
        &self,
        actor: &Actor,
        mechanic_id: Uuid,
    ) -> AppResult<ApiResponse<Vec<RepairSummary>>> {
        let repairs = self.workflow.list_mechanic_repairs(actor, mechanic_id).await?;
        Ok(ApiResponse::success(repairs))
    }

    pub async fn create(&self, actor: &Actor, request: CreateRepairRequest) -> AppResult<ApiResponse<FinishedRepair>> {
        request.validate()?;
        let finished = self.workflow.create_repair(actor, request.into()).await?;
        Ok(ApiResponse::success_with_message(finished, "Reparación creada exitosamente"))
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, request: UpdateRepairRequest) -> AppResult<ApiResponse<Repair>> {
        request.validate()?;
        let repair = self.workflow.update_repair(actor, id, request.into()).await?;
        Ok(ApiResponse::success_with_message(repair, "Reparación actualizada exitosamente"))
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> AppResult<ApiResponse<()>> {
        self.workflow.delete_repair(actor, id).await?;
        Ok(ApiResponse::empty("Reparación eliminada exitosamente"))
    }
}
