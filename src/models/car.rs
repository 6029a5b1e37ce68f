//! Modelo de Car
//!
//! Auto ingresado al taller y su historial de estados.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::status::CarStatus;

/// Auto principal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub kms: i32,
    pub chassis: String,
    pub description: Option<String>,
    pub status: CarStatus,
    pub priority: i32,
    pub client_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Datos ya validados para el alta de un auto
#[derive(Debug, Clone)]
pub struct NewCar {
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub kms: i32,
    pub chassis: String,
    pub description: Option<String>,
    pub priority: i32,
    pub client_id: Uuid,
}

impl NewCar {
    /// Todo auto nuevo entra en estado Entrada
    pub fn into_car(self, now: DateTime<Utc>) -> Car {
        Car {
            id: Uuid::new_v4(),
            license_plate: self.license_plate,
            brand: self.brand,
            model: self.model,
            kms: self.kms,
            chassis: self.chassis,
            description: self.description,
            status: CarStatus::Entrada,
            priority: self.priority,
            client_id: self.client_id,
            mechanic_id: None,
            created_at: now,
        }
    }
}

/// Edición de datos del auto ya normalizados. El estado no se edita acá:
/// sólo cambia por la máquina de estados.
#[derive(Debug, Clone, Default)]
pub struct CarUpdate {
    pub license_plate: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub kms: Option<i32>,
    pub chassis: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i32>,
}

impl CarUpdate {
    pub fn apply_to(self, mut car: Car) -> Car {
        if let Some(license_plate) = self.license_plate {
            car.license_plate = license_plate;
        }
        if let Some(brand) = self.brand {
            car.brand = brand;
        }
        if let Some(model) = self.model {
            car.model = model;
        }
        if let Some(kms) = self.kms {
            car.kms = kms;
        }
        if let Some(chassis) = self.chassis {
            car.chassis = chassis;
        }
        if let Some(description) = self.description {
            car.description = Some(description);
        }
        if let Some(priority) = self.priority {
            car.priority = priority;
        }
        car
    }
}

/// Entrada del historial de estados de un auto
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarStatusChange {
    pub id: Uuid,
    pub car_id: Uuid,
    pub from_status: Option<CarStatus>,
    pub to_status: CarStatus,
    pub changed_by: Option<Uuid>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
