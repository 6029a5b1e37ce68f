//! Ciclo de vida de la solicitud de servicio
//!
//! Cada transición válida de la solicitud arrastra un disparador para la
//! máquina de estados del auto.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::car_machine::CarTrigger;
use crate::models::service_request::ServiceRequest;
use crate::models::status::RequestStatus;
use crate::utils::errors::{invalid_state_error, AppError, AppResult};
use crate::utils::validation::ensure_non_negative;

/// Acción sobre una solicitud existente
#[derive(Debug, Clone, PartialEq)]
pub enum RequestTrigger {
    Assign { mechanic_id: Uuid },
    SendBudget { description: String, cost: Decimal },
    AcceptBudget,
    RejectBudget,
    StartRepair,
    Complete {
        description: Option<String>,
        cost: Option<Decimal>,
    },
    Cancel,
}

impl RequestTrigger {
    pub fn label(&self) -> &'static str {
        match self {
            RequestTrigger::Assign { .. } => "asignar mecánico",
            RequestTrigger::SendBudget { .. } => "enviar presupuesto",
            RequestTrigger::AcceptBudget => "aceptar presupuesto",
            RequestTrigger::RejectBudget => "rechazar presupuesto",
            RequestTrigger::StartRepair => "iniciar reparación",
            RequestTrigger::Complete { .. } => "completar solicitud",
            RequestTrigger::Cancel => "cancelar solicitud",
        }
    }
}

/// Reparación que nace al completar la solicitud
#[derive(Debug, Clone, PartialEq)]
pub struct RepairDraft {
    pub description: String,
    pub cost: Decimal,
}

/// Presupuesto enviado al cliente
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    pub description: String,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestTransition {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub assigned_mechanic_id: Option<Uuid>,
    pub car_trigger: CarTrigger,
    pub repair: Option<RepairDraft>,
    pub budget: Option<BudgetDraft>,
}

impl RequestTransition {
    fn new(request: &ServiceRequest, to: RequestStatus, car_trigger: CarTrigger) -> Self {
        Self {
            from: request.status,
            to,
            assigned_mechanic_id: request.assigned_mechanic_id,
            car_trigger,
            repair: None,
            budget: None,
        }
    }
}

fn reject(request: &ServiceRequest, trigger: &RequestTrigger) -> AppError {
    invalid_state_error(format!(
        "No se puede {} con la solicitud en estado {}",
        trigger.label(),
        request.status.display_name()
    ))
}

fn require_mechanic(request: &ServiceRequest) -> AppResult<()> {
    if request.has_mechanic() {
        return Ok(());
    }
    Err(invalid_state_error(
        "La solicitud no tiene mecánico asignado",
    ))
}

/// Validar el disparador contra el estado guardado de la solicitud
pub fn apply_transition(
    request: &ServiceRequest,
    trigger: &RequestTrigger,
) -> AppResult<RequestTransition> {
    use RequestStatus::*;

    if request.status.is_terminal() {
        return Err(reject(request, trigger));
    }

    match (request.status, trigger) {
        (Pending, RequestTrigger::Assign { mechanic_id }) => {
            let mut transition = RequestTransition::new(request, Assigned, CarTrigger::MechanicAssigned);
            transition.assigned_mechanic_id = Some(*mechanic_id);
            Ok(transition)
        }
        (Assigned | InRepair, RequestTrigger::SendBudget { description, cost }) => {
            require_mechanic(request)?;
            let cost = ensure_non_negative("El costo", *cost)?;
            let mut transition = RequestTransition::new(request, BudgetSent, CarTrigger::BudgetSent);
            transition.budget = Some(BudgetDraft {
                description: description.trim().to_string(),
                cost,
            });
            Ok(transition)
        }
        (BudgetSent, RequestTrigger::AcceptBudget) => {
            require_mechanic(request)?;
            Ok(RequestTransition::new(request, InRepair, CarTrigger::BudgetAccepted))
        }
        (BudgetSent, RequestTrigger::RejectBudget) => {
            require_mechanic(request)?;
            Ok(RequestTransition::new(request, Rejected, CarTrigger::BudgetRejected))
        }
        (Assigned | BudgetSent, RequestTrigger::StartRepair) => {
            require_mechanic(request)?;
            Ok(RequestTransition::new(request, InRepair, CarTrigger::WorkStarted))
        }
        (InRepair, RequestTrigger::Complete { description, cost }) => {
            require_mechanic(request)?;
            let cost = ensure_non_negative("El costo", cost.unwrap_or(Decimal::ZERO))?;
            let description = description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(&request.description)
                .to_string();
            let mut transition = RequestTransition::new(request, Completed, CarTrigger::RepairFinished);
            transition.repair = Some(RepairDraft { description, cost });
            Ok(transition)
        }
        (_, RequestTrigger::Cancel) => Ok(RequestTransition::new(
            request,
            Cancelled,
            CarTrigger::RequestCancelled,
        )),
        _ => Err(reject(request, trigger)),
    }
}
