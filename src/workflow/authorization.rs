//! Gate de autorización
//!
//! Reglas de "quién puede invocar esta transición". Todas se evalúan contra
//! los ids guardados (dueño del auto, jefe y mecánico asignados), nunca
//! contra valores enviados en el body.

use uuid::Uuid;

use super::roles::{require_role, Role, ADMIN_JEFE, ANY_ROLE, CAR_INTAKE, WORKSHOP};
use crate::models::service_request::ServiceRequest;
use crate::models::user::{Actor, Mechanic};
use crate::utils::errors::{forbidden_error, AppResult};

/// Exigir que el rol del actor esté en el conjunto permitido
pub fn require(actor: &Actor, allowed: &[&str]) -> AppResult<()> {
    require_role(actor.role_label.as_deref(), allowed)
}

fn is_owning_client(actor: &Actor, client_id: Uuid) -> bool {
    actor.role() == Some(Role::Cliente) && actor.client_id == Some(client_id)
}

/// Ver un auto: personal del taller o el cliente dueño
pub fn ensure_can_view_car(actor: &Actor, owner_client_id: Uuid) -> AppResult<()> {
    if actor.is_staff() || is_owning_client(actor, owner_client_id) {
        return Ok(());
    }
    Err(forbidden_error("ver este auto", "no pertenece a tu cuenta"))
}

/// Alta de autos: admin, recepcionista o un cliente para sí mismo
pub fn ensure_can_register_car(actor: &Actor, owner_client_id: Uuid) -> AppResult<()> {
    require(actor, CAR_INTAKE)?;
    if actor.role() == Some(Role::Cliente) && actor.client_id != Some(owner_client_id) {
        return Err(forbidden_error(
            "registrar el auto",
            "sólo puedes registrar autos a tu nombre",
        ));
    }
    Ok(())
}

/// Acciones del dueño: aceptar o rechazar presupuesto, cancelar solicitud
pub fn ensure_owner_or_admin(actor: &Actor, owner_client_id: Uuid, operation: &str) -> AppResult<()> {
    if actor.is_admin() || is_owning_client(actor, owner_client_id) {
        return Ok(());
    }
    Err(forbidden_error(operation, "el auto no te pertenece"))
}

/// Crear solicitudes: admin, jefe o el cliente dueño
pub fn ensure_can_create_request(actor: &Actor, owner_client_id: Uuid) -> AppResult<()> {
    if actor.is_admin() || actor.role() == Some(Role::Jefe) || is_owning_client(actor, owner_client_id) {
        return Ok(());
    }
    Err(forbidden_error(
        "crear la solicitud",
        "no puedes crear solicitudes para otros clientes",
    ))
}

/// Asignar mecánico: admin sin restricciones; un jefe sólo sobre sus
/// solicitudes y con mecánicos bajo su supervisión
pub fn ensure_can_assign(actor: &Actor, request: &ServiceRequest, mechanic: &Mechanic) -> AppResult<()> {
    require(actor, ADMIN_JEFE)?;
    if actor.is_admin() {
        return Ok(());
    }

    if actor.boss_id != Some(request.assigned_boss_id) {
        return Err(forbidden_error(
            "asignar esta solicitud",
            "no está asignada a tu equipo",
        ));
    }

    if mechanic.boss_id.is_none() || mechanic.boss_id != actor.boss_id {
        return Err(forbidden_error(
            "asignar el mecánico",
            "sólo puedes asignar mecánicos bajo tu supervisión",
        ));
    }

    Ok(())
}

/// Trabajo sobre la solicitud (presupuesto, inicio, cierre): admin, el
/// mecánico asignado o el jefe de la solicitud
pub fn ensure_can_work_request(actor: &Actor, request: &ServiceRequest) -> AppResult<()> {
    require(actor, WORKSHOP)?;

    let allowed = match actor.role() {
        Some(Role::Admin) => true,
        Some(Role::Mecanico) => {
            actor.mechanic_id.is_some() && actor.mechanic_id == request.assigned_mechanic_id
        }
        Some(Role::Jefe) => actor.boss_id == Some(request.assigned_boss_id),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(forbidden_error(
            "actualizar esta solicitud",
            "no estás asignado a ella",
        ))
    }
}

/// Listado por jefe: admin o el propio jefe
pub fn ensure_can_list_boss_requests(actor: &Actor, boss_id: Uuid) -> AppResult<()> {
    require(actor, ADMIN_JEFE)?;
    if actor.is_admin() || actor.boss_id == Some(boss_id) {
        return Ok(());
    }
    Err(forbidden_error("ver solicitudes", "pertenecen a otro jefe"))
}

/// Listado por mecánico: admin, cualquier jefe o el propio mecánico
pub fn ensure_can_list_mechanic_requests(actor: &Actor, mechanic_id: Uuid) -> AppResult<()> {
    require(actor, WORKSHOP)?;
    match actor.role() {
        Some(Role::Mecanico) if actor.mechanic_id != Some(mechanic_id) => Err(forbidden_error(
            "ver solicitudes",
            "pertenecen a otro mecánico",
        )),
        _ => Ok(()),
    }
}

/// Corregir una reparación: admin, jefe o el mecánico que la hizo
pub fn ensure_can_correct_repair(actor: &Actor, repair_mechanic_id: Option<Uuid>) -> AppResult<()> {
    require(actor, WORKSHOP)?;
    match actor.role() {
        Some(Role::Mecanico) if actor.mechanic_id.is_none() || actor.mechanic_id != repair_mechanic_id => {
            Err(forbidden_error("corregir la reparación", "la hizo otro mecánico"))
        }
        _ => Ok(()),
    }
}

/// Listado por cliente: personal del taller o el propio cliente
pub fn ensure_can_list_client_records(actor: &Actor, client_id: Uuid) -> AppResult<()> {
    if actor.is_staff() || is_owning_client(actor, client_id) {
        return Ok(());
    }
    Err(forbidden_error("ver estos datos", "pertenecen a otro cliente"))
}

/// Pagos: un cliente sólo opera sobre los suyos; el personal sobre todos
pub fn ensure_can_handle_payment(actor: &Actor, client_id: Uuid) -> AppResult<()> {
    require(actor, ANY_ROLE)?;
    if actor.role() == Some(Role::Cliente) && actor.client_id != Some(client_id) {
        return Err(forbidden_error("operar este pago", "pertenece a otro cliente"));
    }
    Ok(())
}
