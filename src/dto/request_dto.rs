use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::RequestStatus;
use crate::services::OpenRequest;
use crate::utils::validation::{validate_non_negative, validate_not_blank};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub car_id: Uuid,
    #[validate(custom = "validate_not_blank", length(max = 1000))]
    pub description: String,
    pub preferred_mechanic_id: Option<Uuid>,
}

impl From<CreateServiceRequest> for OpenRequest {
    fn from(request: CreateServiceRequest) -> Self {
        OpenRequest {
            car_id: request.car_id,
            description: request.description,
            preferred_mechanic_id: request.preferred_mechanic_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignMechanicRequest {
    pub mechanic_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendBudgetRequest {
    #[validate(custom = "validate_not_blank")]
    pub description: String,
    #[validate(custom = "validate_non_negative")]
    pub cost: Decimal,
}

// IN_REPAIR o COMPLETED; al completar, descripción y costo son opcionales
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestStatusRequest {
    pub status: RequestStatus,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub cost: Option<Decimal>,
}
