//! Modelo de ServiceRequest
//!
//! Solicitud de reparación iniciada por un cliente sobre uno de sus autos.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::status::RequestStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    pub description: String,
    pub car_id: Uuid,
    pub client_id: Uuid,
    pub preferred_mechanic_id: Option<Uuid>,
    pub assigned_boss_id: Uuid,
    pub assigned_mechanic_id: Option<Uuid>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// Sin mecánico asignado la solicitud no avanza más allá de Assigned
    pub fn has_mechanic(&self) -> bool {
        self.assigned_mechanic_id.is_some()
    }
}
