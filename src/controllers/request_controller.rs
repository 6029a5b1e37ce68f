use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::request_dto::{
    AssignMechanicRequest, CreateServiceRequest, SendBudgetRequest, UpdateRequestStatusRequest,
};
use crate::dto::ApiResponse;
use crate::models::Actor;
use crate::services::{RequestDetail, RequestOutcome, WorkflowService};
use crate::utils::errors::AppResult;
use crate::utils::validation::format_amount;

pub struct RequestController {
    workflow: Arc<WorkflowService>,
}

impl RequestController {
    pub fn new(workflow: Arc<WorkflowService>) -> Self {
        Self { workflow }
    }

    pub async fn create(&self, actor: &Actor, request: CreateServiceRequest) -> AppResult<ApiResponse<RequestOutcome>> {
        request.validate()?;
        let outcome = self.workflow.create_request(actor, request.into()).await?;
        Ok(ApiResponse::success_with_message(outcome, "Solicitud creada exitosamente"))
    }

    pub async fn assign(
        &self,
        actor: &Actor,
        id: Uuid,
        request: AssignMechanicRequest,
    ) -> AppResult<ApiResponse<RequestOutcome>> {
        let outcome = self.workflow.assign_mechanic(actor, id, request.mechanic_id).await?;
        Ok(ApiResponse::success_with_message(outcome, "Mecánico asignado exitosamente"))
    }

    pub async fn update_status(
        &self,
        actor: &Actor,
        id: Uuid,
        request: UpdateRequestStatusRequest,
    ) -> AppResult<ApiResponse<RequestOutcome>> {
        request.validate()?;
        let outcome = self
            .workflow
            .update_request_status(actor, id, request.status, request.description, request.cost)
            .await?;
        let message = format!("Solicitud actualizada a {}", outcome.request.status.display_name());
        Ok(ApiResponse::success_with_message(outcome, message))
    }

    pub async fn send_budget(
        &self,
        actor: &Actor,
        id: Uuid,
        request: SendBudgetRequest,
    ) -> AppResult<ApiResponse<RequestOutcome>> {
        request.validate()?;
        let cost = request.cost;
        let outcome = self
            .workflow
            .send_budget(actor, id, request.description, cost)
            .await?;
        let message = format!("Presupuesto de ${} enviado al cliente", format_amount(cost));
        Ok(ApiResponse::success_with_message(outcome, message))
    }

    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> AppResult<ApiResponse<RequestOutcome>> {
        let outcome = self.workflow.cancel_request(actor, id).await?;
        Ok(ApiResponse::success_with_message(outcome, "Solicitud cancelada exitosamente"))
    }

    pub async fn list_by_boss(&self, actor: &Actor, boss_id: Uuid) -> AppResult<ApiResponse<Vec<RequestDetail>>> {
        let requests = self.workflow.list_boss_requests(actor, boss_id).await?;
        Ok(ApiResponse::success(requests))
    }

    pub async fn list_by_mechanic(&self, actor: &Actor, mechanic_id: Uuid) -> AppResult<ApiResponse<Vec<RequestDetail>>> {
        let requests = self.workflow.list_mechanic_requests(actor, mechanic_id).await?;
        Ok(ApiResponse::success(requests))
    }

    pub async fn list_by_client(&self, actor: &Actor, client_id: Uuid) -> AppResult<ApiResponse<Vec<RequestDetail>>> {
        let requests = self.workflow.list_client_requests(actor, client_id).await?;
        Ok(ApiResponse::success(requests))
    }
}
