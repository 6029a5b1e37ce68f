//! Registros de estados
//!
//! Tablas estáticas de estados del auto, de las solicitudes de servicio y de
//! los pagos. Los códigos numéricos y de texto son un contrato externo
//! (claves de caché, badges en el frontend): no se renumeran.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::utils::errors::{invalid_input_error, AppError};

/// Estado del auto en el taller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "i16")]
#[repr(i16)]
pub enum CarStatus {
    Entrada = 1,
    Pendiente = 2,
    EnRevision = 3,
    Rechazado = 4,
    EnReparacion = 5,
    Finalizado = 6,
    Entregado = 7,
    Cancelado = 8,
}

impl CarStatus {
    pub const ALL: [CarStatus; 8] = [
        CarStatus::Entrada,
        CarStatus::Pendiente,
        CarStatus::EnRevision,
        CarStatus::Rechazado,
        CarStatus::EnReparacion,
        CarStatus::Finalizado,
        CarStatus::Entregado,
        CarStatus::Cancelado,
    ];

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Nombre canónico que se muestra en el badge
    pub fn name(self) -> &'static str {
        match self {
            CarStatus::Entrada => "Entrada",
            CarStatus::Pendiente => "Pendiente",
            CarStatus::EnRevision => "En Revisión",
            CarStatus::Rechazado => "Rechazado",
            CarStatus::EnReparacion => "En Reparación",
            CarStatus::Finalizado => "Finalizado",
            CarStatus::Entregado => "Entregado",
            CarStatus::Cancelado => "Cancelado",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            CarStatus::Entrada => "#3498db",
            CarStatus::Pendiente => "#f1c40f",
            CarStatus::EnRevision => "#9b59b6",
            CarStatus::Rechazado => "#e74c3c",
            CarStatus::EnReparacion => "#e67e22",
            CarStatus::Finalizado => "#2ecc71",
            CarStatus::Entregado => "#16a085",
            CarStatus::Cancelado => "#7f8c8d",
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i16> for CarStatus {
    type Error = AppError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code)
            .ok_or_else(|| invalid_input_error(format!("Estado de auto inválido: {}", code)))
    }
}

/// Referencia `{ id, name }` que viaja en las respuestas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusRef {
    pub id: i16,
    pub name: &'static str,
}

impl From<CarStatus> for StatusRef {
    fn from(status: CarStatus) -> Self {
        Self {
            id: status.code(),
            name: status.name(),
        }
    }
}

impl Serialize for CarStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StatusRef::from(*self).serialize(serializer)
    }
}

/// Estado de una solicitud de servicio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "ASSIGNED")]
    Assigned,
    #[serde(rename = "PRESUPUESTO_ENVIADO")]
    BudgetSent,
    #[serde(rename = "IN_REPAIR")]
    InRepair,
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 7] = [
        RequestStatus::Pending,
        RequestStatus::Assigned,
        RequestStatus::BudgetSent,
        RequestStatus::InRepair,
        RequestStatus::Rejected,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
    ];

    /// Código persistido
    pub fn code(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Assigned => "ASSIGNED",
            RequestStatus::BudgetSent => "PRESUPUESTO_ENVIADO",
            RequestStatus::InRepair => "IN_REPAIR",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pendiente",
            RequestStatus::Assigned => "Asignada",
            RequestStatus::BudgetSent => "Presupuesto Enviado",
            RequestStatus::InRepair => "En Reparación",
            RequestStatus::Rejected => "Rechazado",
            RequestStatus::Completed => "Completada",
            RequestStatus::Cancelled => "Cancelada",
        }
    }

    /// Completed, Rejected y Cancelled no admiten más transiciones
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Rejected | RequestStatus::Cancelled
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Estado de un pago
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pendiente,
    Pagado,
    Cancelado,
}

impl PaymentStatus {
    pub fn code(self) -> &'static str {
        match self {
            PaymentStatus::Pendiente => "PENDIENTE",
            PaymentStatus::Pagado => "PAGADO",
            PaymentStatus::Cancelado => "CANCELADO",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PENDIENTE" => Some(PaymentStatus::Pendiente),
            "PAGADO" => Some(PaymentStatus::Pagado),
            "CANCELADO" => Some(PaymentStatus::Cancelado),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Entrada del registro de estados del auto expuesta por la API
#[derive(Debug, Clone, Serialize)]
pub struct CarStatusEntry {
    pub id: i16,
    pub name: &'static str,
    pub color: &'static str,
}

/// Registro completo de estados del auto, en orden de código
pub fn car_status_registry() -> Vec<CarStatusEntry> {
    CarStatus::ALL
        .into_iter()
        .map(|status| CarStatusEntry {
            id: status.code(),
            name: status.name(),
            color: status.color(),
        })
        .collect()
}
