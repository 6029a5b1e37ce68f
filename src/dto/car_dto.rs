use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CarUpdate, NewCar};
use crate::utils::validation::{validate_non_negative, validate_not_blank};

// Alta de un auto
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    #[validate(custom = "validate_not_blank")]
    pub license_plate: String,
    #[validate(length(min = 1, max = 50))]
    pub brand: String,
    #[validate(length(min = 1, max = 50))]
    pub model: String,
    #[validate(range(min = 0))]
    pub kms: i32,
    #[validate(custom = "validate_not_blank")]
    pub chassis: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 10))]
    pub priority: i32,
    pub client_id: Uuid,
}

impl From<CreateCarRequest> for NewCar {
    fn from(request: CreateCarRequest) -> Self {
        NewCar {
            license_plate: request.license_plate,
            brand: request.brand,
            model: request.model,
            kms: request.kms,
            chassis: request.chassis,
            description: request.description,
            priority: request.priority,
            client_id: request.client_id,
        }
    }
}

// Edición de un auto; sólo se tocan los campos presentes
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarRequest {
    #[validate(custom = "validate_not_blank")]
    pub license_plate: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub model: Option<String>,
    #[validate(range(min = 0))]
    pub kms: Option<i32>,
    #[validate(custom = "validate_not_blank")]
    pub chassis: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 10))]
    pub priority: Option<i32>,
}

impl From<UpdateCarRequest> for CarUpdate {
    fn from(request: UpdateCarRequest) -> Self {
        CarUpdate {
            license_plate: request.license_plate,
            brand: request.brand,
            model: request.model,
            kms: request.kms,
            chassis: request.chassis,
            description: request.description,
            priority: request.priority,
        }
    }
}

// Transición manual del estado del auto
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CarTransitionRequest {
    pub car_id: Uuid,
    #[validate(range(min = 1, max = 8))]
    pub new_status_id: i16,
    pub description: Option<String>,
}

// Acciones que sólo necesitan el auto (aceptar, rechazar, entregar)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarActionRequest {
    pub car_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinishRepairRequest {
    pub car_id: Uuid,
    #[validate(custom = "validate_not_blank")]
    pub final_description: String,
    #[validate(custom = "validate_non_negative")]
    pub final_cost: Decimal,
}
