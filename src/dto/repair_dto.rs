use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::RepairCorrection;
use crate::services::DirectRepair;
use crate::utils::validation::{validate_non_negative, validate_not_blank};

// Alta directa de una reparación
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepairRequest {
    pub car_id: Uuid,
    pub mechanic_id: Uuid,
    #[validate(custom = "validate_not_blank")]
    pub description: String,
    #[validate(custom = "validate_non_negative")]
    pub cost: Decimal,
    #[serde(alias = "warrantyDays")]
    #[validate(range(min = 0))]
    pub warranty: Option<i32>,
}

impl From<CreateRepairRequest> for DirectRepair {
    fn from(request: CreateRepairRequest) -> Self {
        DirectRepair {
            car_id: request.car_id,
            mechanic_id: request.mechanic_id,
            description: request.description,
            cost: request.cost,
            warranty_days: request.warranty,
        }
    }
}

// Corrección de una reparación
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRepairRequest {
    #[validate(custom = "validate_not_blank")]
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub cost: Option<Decimal>,
    #[serde(alias = "warrantyDays")]
    #[validate(range(min = 0))]
    pub warranty: Option<i32>,
}

impl From<UpdateRepairRequest> for RepairCorrection {
    fn from(request: UpdateRepairRequest) -> Self {
        RepairCorrection {
            description: request.description,
            cost: request.cost,
            warranty_days: request.warranty,
        }
    }
}
