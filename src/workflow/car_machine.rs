//! Máquina de estados del auto
//!
//! Única fuente de verdad de las transiciones del auto. Cada disparador
//! produce la lista de escrituras de estado a aplicar en orden: los rebotes
//! Rechazado → Entrada y Cancelado → Entrada quedan como dos escrituras para
//! que el historial conserve el paso intermedio.

use serde::Serialize;

use crate::models::status::CarStatus;
use crate::utils::errors::{invalid_state_error, AppResult};

/// Acción del taller que mueve el estado del auto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarTrigger {
    /// Se creó una solicitud de servicio
    RequestOpened,
    MechanicAssigned,
    BudgetSent,
    BudgetAccepted,
    BudgetRejected,
    /// Mecánico o jefe marca el trabajo en curso
    WorkStarted,
    RepairFinished,
    Delivered,
    RequestCancelled,
    /// Transición manual a cualquier código válido
    Manual(CarStatus),
}

impl CarTrigger {
    pub fn label(self) -> &'static str {
        match self {
            CarTrigger::RequestOpened => "solicitud creada",
            CarTrigger::MechanicAssigned => "mecánico asignado",
            CarTrigger::BudgetSent => "presupuesto enviado",
            CarTrigger::BudgetAccepted => "presupuesto aceptado",
            CarTrigger::BudgetRejected => "presupuesto rechazado",
            CarTrigger::WorkStarted => "reparación iniciada",
            CarTrigger::RepairFinished => "reparación finalizada",
            CarTrigger::Delivered => "auto entregado",
            CarTrigger::RequestCancelled => "solicitud cancelada",
            CarTrigger::Manual(_) => "transición manual",
        }
    }
}

/// Resultado de aplicar un disparador: estado de partida y escrituras
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarTransition {
    pub from: CarStatus,
    pub writes: Vec<CarStatus>,
}

impl CarTransition {
    /// Estado en el que queda el auto
    pub fn final_status(&self) -> CarStatus {
        self.writes.last().copied().unwrap_or(self.from)
    }
}

/// Validar el disparador contra el estado actual y calcular las escrituras
pub fn apply_transition(current: CarStatus, trigger: CarTrigger) -> AppResult<CarTransition> {
    let writes = match trigger {
        CarTrigger::Manual(target) => vec![target],
        // Se entrega un auto sin trabajo en curso: recién ingresado o con la
        // reparación terminada
        CarTrigger::Delivered => match current {
            CarStatus::Entrada | CarStatus::Finalizado => vec![CarStatus::Entregado],
            CarStatus::Entregado => {
                return Err(invalid_state_error("El auto ya fue entregado"));
            }
            other => {
                return Err(invalid_state_error(format!(
                    "No se puede entregar un auto en estado {}: sólo desde Entrada o Finalizado",
                    other
                )));
            }
        },
        CarTrigger::RepairFinished => match current {
            CarStatus::Finalizado | CarStatus::Entregado | CarStatus::Cancelado => {
                return Err(invalid_state_error(format!(
                    "No se puede finalizar la reparación de un auto en estado {}",
                    current
                )));
            }
            _ => vec![CarStatus::Finalizado],
        },
        // Un auto entregado sólo vuelve al flujo con una solicitud nueva; una
        // solicitud que siguió viva tras una entrega manual aún se cancela
        workflow_trigger
            if current == CarStatus::Entregado
                && !matches!(
                    workflow_trigger,
                    CarTrigger::RequestOpened | CarTrigger::RequestCancelled
                ) =>
        {
            return Err(invalid_state_error(format!(
                "El auto ya fue entregado ({})",
                workflow_trigger.label()
            )));
        }
        CarTrigger::RequestOpened | CarTrigger::BudgetSent => vec![CarStatus::Pendiente],
        CarTrigger::MechanicAssigned => vec![CarStatus::EnRevision],
        CarTrigger::BudgetAccepted | CarTrigger::WorkStarted => vec![CarStatus::EnReparacion],
        CarTrigger::BudgetRejected => vec![CarStatus::Rechazado, CarStatus::Entrada],
        CarTrigger::RequestCancelled => vec![CarStatus::Cancelado, CarStatus::Entrada],
    };

    Ok(CarTransition {
        from: current,
        writes,
    })
}
