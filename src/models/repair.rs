//! Modelo de Repair
//!
//! Registro del trabajo terminado sobre un auto. Sólo cambia por una
//! corrección autorizada.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Garantía por defecto, en días
pub const DEFAULT_WARRANTY_DAYS: i32 = 90;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repair {
    pub id: Uuid,
    pub description: String,
    pub cost: Decimal,
    pub warranty_days: i32,
    pub car_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Reparación a crear junto con la transición que la origina
#[derive(Debug, Clone, PartialEq)]
pub struct NewRepair {
    pub description: String,
    pub cost: Decimal,
    pub warranty_days: i32,
    pub car_id: Uuid,
    pub mechanic_id: Option<Uuid>,
}

impl NewRepair {
    pub fn into_repair(self, now: DateTime<Utc>) -> Repair {
        Repair {
            id: Uuid::new_v4(),
            description: self.description,
            cost: self.cost,
            warranty_days: self.warranty_days,
            car_id: self.car_id,
            mechanic_id: self.mechanic_id,
            created_at: now,
        }
    }
}

/// Corrección de una reparación existente
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairCorrection {
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub warranty_days: Option<i32>,
}

impl RepairCorrection {
    /// `true` si el costo cambia respecto de la reparación actual
    pub fn changes_cost(&self, repair: &Repair) -> bool {
        self.cost.is_some_and(|cost| cost != repair.cost)
    }

    pub fn apply_to(self, mut repair: Repair) -> Repair {
        if let Some(description) = self.description {
            repair.description = description;
        }
        if let Some(cost) = self.cost {
            repair.cost = cost;
        }
        if let Some(warranty_days) = self.warranty_days {
            repair.warranty_days = warranty_days;
        }
        repair
    }
}

/// Reparación junto con los datos del auto, para los listados
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSummary {
    #[serde(flatten)]
    pub repair: Repair,
    pub license_plate: String,
    pub client_id: Uuid,
}
