use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::dto::email_dto::{RegistrationConfirmationRequest, TestEmailRequest};
use crate::dto::ApiResponse;
use crate::models::Actor;
use crate::queue::{EmailJob, JobQueue};
use crate::utils::errors::{AppError, AppResult};
use crate::workflow::authorization::require;
use crate::workflow::roles::ADMIN;

pub struct EmailController {
    queue: Arc<dyn JobQueue>,
}

impl EmailController {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    /// Encolar un email de prueba (sólo admin)
    pub async fn send_test(&self, actor: &Actor, request: TestEmailRequest) -> AppResult<ApiResponse<Value>> {
        require(actor, ADMIN)?;
        request.validate()?;

        let job = EmailJob::TestEmail {
            email: request.email.clone(),
        };
        let kind = self.enqueue(job).await?;

        Ok(ApiResponse::success_with_message(
            json!({ "email": request.email, "job": kind }),
            "Email de prueba encolado",
        ))
    }

    /// Encolar la confirmación de registro de un usuario nuevo (sólo admin)
    pub async fn send_registration_confirmation(
        &self,
        actor: &Actor,
        request: RegistrationConfirmationRequest,
    ) -> AppResult<ApiResponse<Value>> {
        require(actor, ADMIN)?;
        request.validate()?;

        let sent_at = Utc::now();
        let job = EmailJob::RegistrationConfirmation {
            email: request.email.clone(),
            name: request.name.trim().to_string(),
            login_date_time: sent_at,
        };
        let kind = self.enqueue(job).await?;

        Ok(ApiResponse::success_with_message(
            json!({ "email": request.email, "job": kind, "sentAt": sent_at }),
            "Confirmación de registro encolada",
        ))
    }

    async fn enqueue(&self, job: EmailJob) -> AppResult<&'static str> {
        let kind = job.kind();
        self.queue
            .enqueue(job)
            .await
            .map_err(|e| AppError::Internal(format!("No se pudo encolar el email: {}", e)))?;
        Ok(kind)
    }
}
