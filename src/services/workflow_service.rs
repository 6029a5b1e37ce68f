//! Servicio de flujo de trabajo
//!
//! Orquesta cada acción del taller: gate de autorización → máquina de
//! estados de la solicitud → máquina de estados del auto → commit atómico en
//! el store → notificación best effort.

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::notification_service::NotificationHub;
use crate::cache::{ResponseCache, REPAIRS_NAMESPACE};
use crate::models::{
    Actor, Car, CarStatus, CarStatusChange, CarUpdate, NewCar, NewRepair, Repair,
    RepairCorrection, RepairSummary, RequestStatus, ServiceRequest, DEFAULT_WARRANTY_DAYS,
};
use crate::repositories::{CarWrite, CommitOutcome, RequestWrite, Store, TransitionPlan};
use crate::utils::errors::{
    invalid_input_error, invalid_state_error, not_found_error, AppError, AppResult,
};
use crate::utils::validation::{ensure_non_negative, normalize_chassis, normalize_license_plate};
use crate::workflow::authorization::{self, require};
use crate::workflow::roles::{ADMIN, ANY_ROLE, FRONT_DESK, WORKSHOP};
use crate::workflow::{car_machine, request_machine, CarTrigger, RequestTrigger};

/// Datos para abrir una solicitud de servicio
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub car_id: Uuid,
    pub description: String,
    pub preferred_mechanic_id: Option<Uuid>,
}

/// Estado de la solicitud y del auto después de una transición
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutcome {
    pub request: ServiceRequest,
    pub car: Car,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair: Option<Repair>,
}

/// Solicitud con su auto y, si está completada, la última reparación
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: ServiceRequest,
    pub car: Option<Car>,
    pub repair: Option<Repair>,
}

/// Reparación cargada directamente por el taller, sin solicitud de servicio
#[derive(Debug, Clone)]
pub struct DirectRepair {
    pub car_id: Uuid,
    pub mechanic_id: Uuid,
    pub description: String,
    pub cost: Decimal,
    pub warranty_days: Option<i32>,
}

/// Auto con la reparación creada al finalizar el trabajo
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedRepair {
    pub car: Car,
    pub repair: Repair,
}

pub struct WorkflowService {
    store: Arc<dyn Store>,
    notifier: NotificationHub,
    cache: Arc<dyn ResponseCache>,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn Store>, notifier: NotificationHub, cache: Arc<dyn ResponseCache>) -> Self {
        Self {
            store,
            notifier,
            cache,
        }
    }

    async fn load_car(&self, car_id: Uuid) -> AppResult<Car> {
        self.store
            .find_car(car_id)
            .await?
            .ok_or_else(|| not_found_error("Auto", car_id))
    }

    async fn load_request(&self, request_id: Uuid) -> AppResult<ServiceRequest> {
        self.store
            .find_request(request_id)
            .await?
            .ok_or_else(|| not_found_error("Solicitud", request_id))
    }

    // ---------------------------------------------------------------------
    // Autos
    // ---------------------------------------------------------------------

    /// Alta de un auto en estado Entrada
    pub async fn register_car(&self, actor: &Actor, car: NewCar) -> AppResult<Car> {
        authorization::ensure_can_register_car(actor, car.client_id)?;

        if self.store.find_client(car.client_id).await?.is_none() {
            return Err(not_found_error("Cliente", car.client_id));
        }

        let car = NewCar {
            license_plate: normalize_license_plate(&car.license_plate)?,
            chassis: normalize_chassis(&car.chassis)?,
            brand: car.brand.trim().to_string(),
            model: car.model.trim().to_string(),
            description: car
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..car
        };
        if car.kms < 0 {
            return Err(invalid_input_error("El kilometraje no puede ser negativo"));
        }

        let car = self.store.insert_car(car, Utc::now()).await?;
        info!("🚗 Auto {} ingresado al taller", car.license_plate);
        Ok(car)
    }

    /// Edición de datos del auto: patente y chasis se vuelven a normalizar
    pub async fn update_car(&self, actor: &Actor, car_id: Uuid, update: CarUpdate) -> AppResult<Car> {
        require(actor, FRONT_DESK)?;

        let update = CarUpdate {
            license_plate: update
                .license_plate
                .as_deref()
                .map(normalize_license_plate)
                .transpose()?,
            chassis: update.chassis.as_deref().map(normalize_chassis).transpose()?,
            brand: non_blank(update.brand, "La marca")?,
            model: non_blank(update.model, "El modelo")?,
            description: update
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..update
        };
        if update.kms.is_some_and(|kms| kms < 0) {
            return Err(invalid_input_error("El kilometraje no puede ser negativo"));
        }

        let current = self.load_car(car_id).await?;
        let plate_changed = update
            .license_plate
            .as_ref()
            .is_some_and(|plate| *plate != current.license_plate);

        let car = self.store.update_car(car_id, update).await?;
        if plate_changed {
            // Los listados de reparaciones muestran la patente
            self.cache.invalidate_namespace(REPAIRS_NAMESPACE).await;
        }
        info!("✏️ Auto {} actualizado", car.license_plate);
        Ok(car)
    }

    pub async fn get_car(&self, actor: &Actor, car_id: Uuid) -> AppResult<Car> {
        let car = self.load_car(car_id).await?;
        authorization::ensure_can_view_car(actor, car.client_id)?;
        Ok(car)
    }

    /// Personal del taller ve todos los autos; un cliente sólo los suyos
    pub async fn list_cars(&self, actor: &Actor) -> AppResult<Vec<Car>> {
        require(actor, ANY_ROLE)?;
        if actor.is_staff() {
            return self.store.list_cars().await;
        }
        match actor.client_id {
            Some(client_id) => self.store.list_cars_by_client(client_id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn list_client_cars(&self, actor: &Actor, client_id: Uuid) -> AppResult<Vec<Car>> {
        authorization::ensure_can_list_client_records(actor, client_id)?;
        self.store.list_cars_by_client(client_id).await
    }

    pub async fn car_history(&self, actor: &Actor, car_id: Uuid) -> AppResult<Vec<CarStatusChange>> {
        let car = self.load_car(car_id).await?;
        authorization::ensure_can_view_car(actor, car.client_id)?;
        self.store.car_history(car_id).await
    }

    pub async fn delete_car(&self, actor: &Actor, car_id: Uuid) -> AppResult<()> {
        require(actor, ADMIN)?;
        self.store.delete_car(car_id).await?;
        info!("🗑️ Auto {} eliminado", car_id);
        Ok(())
    }

    /// Commit de una transición que sólo toca el auto
    async fn apply_car_transition(
        &self,
        actor: &Actor,
        car: &Car,
        trigger: CarTrigger,
        description: Option<String>,
        repair: Option<NewRepair>,
    ) -> AppResult<CommitOutcome> {
        let transition = car_machine::apply_transition(car.status, trigger)?;

        let mut plan = TransitionPlan::new(Utc::now());
        plan.car = Some(CarWrite {
            car_id: car.id,
            expected: car.status,
            writes: transition.writes,
            mechanic_id: None,
            description,
            changed_by: Some(actor.user_id),
            reason: Some(trigger.label().to_string()),
        });
        plan.repair = repair;

        let outcome = self.store.commit(plan).await?;
        if let Some(updated) = &outcome.car {
            info!(
                "🔄 Auto {}: {} → {} ({})",
                updated.license_plate,
                car.status,
                updated.status,
                trigger.label()
            );
            self.notifier
                .car_state_changed(updated.clone(), Some(car.status))
                .await;
        }
        Ok(outcome)
    }

    /// Transición manual a cualquier estado válido
    pub async fn manual_transition(
        &self,
        actor: &Actor,
        car_id: Uuid,
        status_code: i16,
        description: Option<String>,
    ) -> AppResult<Car> {
        require(actor, WORKSHOP)?;
        let target = CarStatus::try_from(status_code)?;
        let car = self.load_car(car_id).await?;

        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let outcome = self
            .apply_car_transition(actor, &car, CarTrigger::Manual(target), description, None)
            .await?;
        committed_car(outcome.car)
    }

    /// Entrega del auto al cliente
    pub async fn deliver_car(&self, actor: &Actor, car_id: Uuid) -> AppResult<Car> {
        require(actor, FRONT_DESK)?;
        let car = self.load_car(car_id).await?;
        let outcome = self
            .apply_car_transition(actor, &car, CarTrigger::Delivered, None, None)
            .await?;
        committed_car(outcome.car)
    }

    /// Cierre directo del trabajo: crea la reparación y deja el auto
    /// Finalizado. Si el auto tiene una solicitud en reparación, la completa;
    /// con una solicitud viva en otro estado se rechaza.
    pub async fn finish_repair(
        &self,
        actor: &Actor,
        car_id: Uuid,
        description: &str,
        cost: Decimal,
    ) -> AppResult<FinishedRepair> {
        require(actor, WORKSHOP)?;
        let description = description.trim();
        if description.is_empty() {
            return Err(invalid_input_error("La descripción final es requerida"));
        }
        let cost = ensure_non_negative("El costo final", cost)?;
        let car = self.load_car(car_id).await?;

        match self.live_request(car_id).await? {
            Some(request) if request.status == RequestStatus::InRepair => {
                authorization::ensure_can_work_request(actor, &request)?;
                let trigger = RequestTrigger::Complete {
                    description: Some(description.to_string()),
                    cost: Some(cost),
                };
                let outcome = self.apply_request_transition(actor, request, car, trigger).await?;
                let repair = committed_repair(outcome.repair)?;
                Ok(FinishedRepair {
                    car: outcome.car,
                    repair,
                })
            }
            Some(request) => Err(live_request_error(&request)),
            None => {
                let repair = NewRepair {
                    description: description.to_string(),
                    cost,
                    warranty_days: DEFAULT_WARRANTY_DAYS,
                    car_id,
                    mechanic_id: actor.mechanic_id.or(car.mechanic_id),
                };
                self.record_direct_repair(actor, &car, repair).await
            }
        }
    }

    /// Alta directa de una reparación hecha por un mecánico; el auto queda
    /// Finalizado igual que al cerrar el trabajo
    pub async fn create_repair(&self, actor: &Actor, input: DirectRepair) -> AppResult<FinishedRepair> {
        require(actor, WORKSHOP)?;
        let description = input.description.trim();
        if description.is_empty() {
            return Err(invalid_input_error("La descripción es requerida"));
        }
        let cost = ensure_non_negative("El costo", input.cost)?;
        let warranty_days = ensure_warranty(input.warranty_days.unwrap_or(DEFAULT_WARRANTY_DAYS))?;

        let car = self.load_car(input.car_id).await?;
        if self.store.find_mechanic(input.mechanic_id).await?.is_none() {
            return Err(not_found_error("Mecánico", input.mechanic_id));
        }
        if let Some(request) = self.live_request(car.id).await? {
            return Err(live_request_error(&request));
        }

        let repair = NewRepair {
            description: description.to_string(),
            cost,
            warranty_days,
            car_id: car.id,
            mechanic_id: Some(input.mechanic_id),
        };
        self.record_direct_repair(actor, &car, repair).await
    }

    async fn record_direct_repair(
        &self,
        actor: &Actor,
        car: &Car,
        repair: NewRepair,
    ) -> AppResult<FinishedRepair> {
        let outcome = self
            .apply_car_transition(actor, car, CarTrigger::RepairFinished, None, Some(repair))
            .await?;
        self.cache.invalidate_namespace(REPAIRS_NAMESPACE).await;
        Ok(FinishedRepair {
            car: committed_car(outcome.car)?,
            repair: committed_repair(outcome.repair)?,
        })
    }

    /// Solicitud no terminal del auto, si la hay (a lo sumo una)
    async fn live_request(&self, car_id: Uuid) -> AppResult<Option<ServiceRequest>> {
        Ok(self
            .store
            .list_requests_by_car(car_id)
            .await?
            .into_iter()
            .find(|request| !request.status.is_terminal()))
    }

    // ---------------------------------------------------------------------
    // Solicitudes de servicio
    // ---------------------------------------------------------------------

    /// Jefe de la solicitud: el del mecánico preferido o uno al azar
    async fn route_boss(&self, preferred_mechanic_id: Option<Uuid>) -> AppResult<Uuid> {
        if let Some(mechanic_id) = preferred_mechanic_id {
            let mechanic = self
                .store
                .find_mechanic(mechanic_id)
                .await?
                .ok_or_else(|| not_found_error("Mecánico", mechanic_id))?;
            if let Some(boss_id) = mechanic.boss_id {
                return Ok(boss_id);
            }
            warn!("⚠️ Mecánico {} sin jefe, se asigna un jefe al azar", mechanic_id);
        }

        let bosses = self.store.list_boss_ids().await?;
        bosses
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or(AppError::NoBossAvailable)
    }

    /// Abrir una solicitud: queda Pending y el auto pasa a Pendiente
    pub async fn create_request(&self, actor: &Actor, input: OpenRequest) -> AppResult<RequestOutcome> {
        let car = self.load_car(input.car_id).await?;
        authorization::ensure_can_create_request(actor, car.client_id)?;

        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(invalid_input_error("La descripción es requerida"));
        }

        if self.live_request(car.id).await?.is_some() {
            return Err(invalid_state_error(
                "El auto ya tiene una solicitud de servicio en curso",
            ));
        }

        let car_transition = car_machine::apply_transition(car.status, CarTrigger::RequestOpened)?;
        let assigned_boss_id = self.route_boss(input.preferred_mechanic_id).await?;
        let now = Utc::now();

        let request = ServiceRequest {
            id: Uuid::new_v4(),
            description,
            car_id: car.id,
            client_id: car.client_id,
            preferred_mechanic_id: input.preferred_mechanic_id,
            assigned_boss_id,
            assigned_mechanic_id: None,
            status: RequestStatus::Pending,
            created_at: now,
        };

        let mut plan = TransitionPlan::new(now);
        plan.request = Some(RequestWrite::Insert(request));
        plan.car = Some(CarWrite {
            car_id: car.id,
            expected: car.status,
            writes: car_transition.writes,
            mechanic_id: None,
            description: None,
            changed_by: Some(actor.user_id),
            reason: Some(CarTrigger::RequestOpened.label().to_string()),
        });

        let outcome = self.store.commit(plan).await?;
        let request = committed_request(outcome.request)?;
        let updated = committed_car(outcome.car)?;
        info!(
            "📝 Solicitud {} creada para el auto {} (jefe {})",
            request.id, updated.license_plate, request.assigned_boss_id
        );
        self.notifier
            .car_state_changed(updated.clone(), Some(car.status))
            .await;

        Ok(RequestOutcome {
            request,
            car: updated,
            repair: None,
        })
    }

    /// Aplica un disparador validado por las dos máquinas y confirma todo
    /// en una sola unidad de trabajo. La autorización ya fue verificada.
    async fn apply_request_transition(
        &self,
        actor: &Actor,
        request: ServiceRequest,
        car: Car,
        trigger: RequestTrigger,
    ) -> AppResult<RequestOutcome> {
        let transition = request_machine::apply_transition(&request, &trigger)?;
        let car_transition = car_machine::apply_transition(car.status, transition.car_trigger)?;
        let now = Utc::now();

        let mut plan = TransitionPlan::new(now);
        plan.request = Some(RequestWrite::Update {
            id: request.id,
            expected: transition.from,
            status: transition.to,
            assigned_mechanic_id: transition.assigned_mechanic_id,
        });
        plan.car = Some(CarWrite {
            car_id: car.id,
            expected: car.status,
            writes: car_transition.writes,
            mechanic_id: transition.assigned_mechanic_id,
            description: None,
            changed_by: Some(actor.user_id),
            reason: Some(trigger.label().to_string()),
        });
        plan.repair = transition.repair.as_ref().map(|draft| NewRepair {
            description: draft.description.clone(),
            cost: draft.cost,
            warranty_days: DEFAULT_WARRANTY_DAYS,
            car_id: car.id,
            mechanic_id: transition.assigned_mechanic_id,
        });

        let outcome = self.store.commit(plan).await?;
        let updated_request = committed_request(outcome.request)?;
        let updated_car = committed_car(outcome.car)?;
        info!(
            "🔄 Solicitud {}: {} → {} | auto {}: {} → {}",
            updated_request.id,
            transition.from,
            transition.to,
            updated_car.license_plate,
            car.status,
            updated_car.status
        );

        if outcome.repair.is_some() {
            self.cache.invalidate_namespace(REPAIRS_NAMESPACE).await;
        }

        match transition.budget {
            Some(budget) => self.notifier.budget_sent(updated_car.clone(), budget).await,
            None => {
                self.notifier
                    .car_state_changed(updated_car.clone(), Some(car.status))
                    .await
            }
        }

        Ok(RequestOutcome {
            request: updated_request,
            car: updated_car,
            repair: outcome.repair,
        })
    }

    /// Asignar mecánico (Pending → Assigned)
    pub async fn assign_mechanic(
        &self,
        actor: &Actor,
        request_id: Uuid,
        mechanic_id: Uuid,
    ) -> AppResult<RequestOutcome> {
        let request = self.load_request(request_id).await?;
        let mechanic = self
            .store
            .find_mechanic(mechanic_id)
            .await?
            .ok_or_else(|| not_found_error("Mecánico", mechanic_id))?;
        authorization::ensure_can_assign(actor, &request, &mechanic)?;

        let car = self.load_car(request.car_id).await?;
        self.apply_request_transition(actor, request, car, RequestTrigger::Assign { mechanic_id })
            .await
    }

    /// Enviar presupuesto (Assigned|InRepair → BudgetSent)
    pub async fn send_budget(
        &self,
        actor: &Actor,
        request_id: Uuid,
        description: String,
        cost: Decimal,
    ) -> AppResult<RequestOutcome> {
        let request = self.load_request(request_id).await?;
        authorization::ensure_can_work_request(actor, &request)?;
        if description.trim().is_empty() {
            return Err(invalid_input_error("La descripción del presupuesto es requerida"));
        }

        let car = self.load_car(request.car_id).await?;
        self.apply_request_transition(
            actor,
            request,
            car,
            RequestTrigger::SendBudget { description, cost },
        )
        .await
    }

    /// Avance directo por el taller: IN_REPAIR o COMPLETED
    pub async fn update_request_status(
        &self,
        actor: &Actor,
        request_id: Uuid,
        status: RequestStatus,
        description: Option<String>,
        cost: Option<Decimal>,
    ) -> AppResult<RequestOutcome> {
        let request = self.load_request(request_id).await?;
        authorization::ensure_can_work_request(actor, &request)?;

        let trigger = match status {
            RequestStatus::InRepair => RequestTrigger::StartRepair,
            RequestStatus::Completed => RequestTrigger::Complete { description, cost },
            other => {
                return Err(invalid_input_error(format!(
                    "Estado no permitido para esta operación: {}",
                    other
                )))
            }
        };

        let car = self.load_car(request.car_id).await?;
        self.apply_request_transition(actor, request, car, trigger).await
    }

    /// Cancelar la solicitud: el auto rebota Cancelado → Entrada
    pub async fn cancel_request(&self, actor: &Actor, request_id: Uuid) -> AppResult<RequestOutcome> {
        let request = self.load_request(request_id).await?;
        let car = self.load_car(request.car_id).await?;
        authorization::ensure_owner_or_admin(actor, car.client_id, "cancelar la solicitud")?;
        self.apply_request_transition(actor, request, car, RequestTrigger::Cancel)
            .await
    }

    /// Única solicitud del auto con presupuesto enviado y mecánico asignado
    async fn budget_request_for(&self, car_id: Uuid) -> AppResult<ServiceRequest> {
        let mut candidates: Vec<ServiceRequest> = self
            .store
            .list_requests_by_car(car_id)
            .await?
            .into_iter()
            .filter(|request| request.status == RequestStatus::BudgetSent && request.has_mechanic())
            .collect();

        match candidates.len() {
            1 => Ok(candidates.remove(0)),
            0 => Err(invalid_state_error(
                "No hay un presupuesto pendiente de respuesta para este auto",
            )),
            _ => Err(invalid_state_error(
                "Hay más de un presupuesto pendiente para este auto",
            )),
        }
    }

    pub async fn accept_budget(&self, actor: &Actor, car_id: Uuid) -> AppResult<RequestOutcome> {
        let car = self.load_car(car_id).await?;
        authorization::ensure_owner_or_admin(actor, car.client_id, "aceptar el presupuesto")?;
        let request = self.budget_request_for(car_id).await?;
        self.apply_request_transition(actor, request, car, RequestTrigger::AcceptBudget)
            .await
    }

    /// Rechazar presupuesto: el auto termina en Entrada
    pub async fn reject_budget(&self, actor: &Actor, car_id: Uuid) -> AppResult<RequestOutcome> {
        let car = self.load_car(car_id).await?;
        authorization::ensure_owner_or_admin(actor, car.client_id, "rechazar el presupuesto")?;
        let request = self.budget_request_for(car_id).await?;
        self.apply_request_transition(actor, request, car, RequestTrigger::RejectBudget)
            .await
    }

    async fn with_details(&self, requests: Vec<ServiceRequest>) -> AppResult<Vec<RequestDetail>> {
        let mut details = Vec::with_capacity(requests.len());
        for request in requests {
            let car = self.store.find_car(request.car_id).await?;
            let repair = if request.status == RequestStatus::Completed {
                self.store.latest_repair_for_car(request.car_id).await?
            } else {
                None
            };
            details.push(RequestDetail { request, car, repair });
        }
        Ok(details)
    }

    pub async fn list_boss_requests(&self, actor: &Actor, boss_id: Uuid) -> AppResult<Vec<RequestDetail>> {
        authorization::ensure_can_list_boss_requests(actor, boss_id)?;
        let requests = self.store.list_requests_by_boss(boss_id).await?;
        self.with_details(requests).await
    }

    pub async fn list_mechanic_requests(
        &self,
        actor: &Actor,
        mechanic_id: Uuid,
    ) -> AppResult<Vec<RequestDetail>> {
        authorization::ensure_can_list_mechanic_requests(actor, mechanic_id)?;
        let requests = self.store.list_requests_by_mechanic(mechanic_id).await?;
        self.with_details(requests).await
    }

    pub async fn list_client_requests(
        &self,
        actor: &Actor,
        client_id: Uuid,
    ) -> AppResult<Vec<RequestDetail>> {
        authorization::ensure_can_list_client_records(actor, client_id)?;
        let requests = self.store.list_requests_by_client(client_id).await?;
        self.with_details(requests).await
    }

    // ---------------------------------------------------------------------
    // Reparaciones
    // ---------------------------------------------------------------------

    /// Personal del taller ve todas; un cliente sólo las de sus autos
    pub async fn list_repairs(&self, actor: &Actor) -> AppResult<Vec<RepairSummary>> {
        require(actor, ANY_ROLE)?;
        if actor.is_staff() {
            return self.store.list_repairs(None).await;
        }
        match actor.client_id {
            Some(client_id) => self.store.list_repairs(Some(client_id)).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_repair(&self, actor: &Actor, repair_id: Uuid) -> AppResult<Repair> {
        require(actor, ANY_ROLE)?;
        let repair = self
            .store
            .find_repair(repair_id)
            .await?
            .ok_or_else(|| not_found_error("Reparación", repair_id))?;
        if !actor.is_staff() {
            let car = self.load_car(repair.car_id).await?;
            authorization::ensure_can_view_car(actor, car.client_id)?;
        }
        Ok(repair)
    }

    pub async fn list_mechanic_repairs(
        &self,
        actor: &Actor,
        mechanic_id: Uuid,
    ) -> AppResult<Vec<RepairSummary>> {
        authorization::ensure_can_list_mechanic_requests(actor, mechanic_id)?;
        self.store.list_repairs_by_mechanic(mechanic_id).await
    }

    /// Corrección de descripción, costo o garantía
    pub async fn update_repair(
        &self,
        actor: &Actor,
        repair_id: Uuid,
        correction: RepairCorrection,
    ) -> AppResult<Repair> {
        require(actor, WORKSHOP)?;
        let repair = self
            .store
            .find_repair(repair_id)
            .await?
            .ok_or_else(|| not_found_error("Reparación", repair_id))?;
        authorization::ensure_can_correct_repair(actor, repair.mechanic_id)?;

        let correction = RepairCorrection {
            description: non_blank(correction.description, "La descripción")?,
            cost: correction
                .cost
                .map(|cost| ensure_non_negative("El costo", cost))
                .transpose()?,
            warranty_days: correction.warranty_days.map(ensure_warranty).transpose()?,
        };
        if correction == RepairCorrection::default() {
            return Err(invalid_input_error("No hay cambios para aplicar"));
        }

        let updated = self.store.update_repair(repair_id, correction).await?;
        self.cache.invalidate_namespace(REPAIRS_NAMESPACE).await;
        info!("✏️ Reparación {} corregida", repair_id);
        Ok(updated)
    }

    pub async fn delete_repair(&self, actor: &Actor, repair_id: Uuid) -> AppResult<()> {
        require(actor, ADMIN)?;
        self.store.delete_repair(repair_id).await?;
        self.cache.invalidate_namespace(REPAIRS_NAMESPACE).await;
        info!("🗑️ Reparación {} eliminada", repair_id);
        Ok(())
    }

    /// Reparaciones de un auto, para el personal o el dueño
    pub async fn car_repairs(&self, actor: &Actor, car_id: Uuid) -> AppResult<Vec<RepairSummary>> {
        require(actor, ANY_ROLE)?;
        let car = self.load_car(car_id).await?;
        authorization::ensure_can_view_car(actor, car.client_id)?;
        let repairs = self.store.list_repairs(Some(car.client_id)).await?;
        Ok(repairs
            .into_iter()
            .filter(|summary| summary.repair.car_id == car_id)
            .collect())
    }
}

fn committed_car(car: Option<Car>) -> AppResult<Car> {
    car.ok_or_else(|| AppError::Internal("commit sin auto".to_string()))
}

fn committed_request(request: Option<ServiceRequest>) -> AppResult<ServiceRequest> {
    request.ok_or_else(|| AppError::Internal("commit sin solicitud".to_string()))
}

fn committed_repair(repair: Option<Repair>) -> AppResult<Repair> {
    repair.ok_or_else(|| AppError::Internal("commit sin reparación".to_string()))
}

/// Una reparación directa no puede convivir con una solicitud abierta: la
/// solicitud la crearía otra vez al completarse
fn live_request_error(request: &ServiceRequest) -> AppError {
    invalid_state_error(format!(
        "El auto tiene una solicitud en curso ({}): complétela o cancélela primero",
        request.status
    ))
}

fn ensure_warranty(days: i32) -> AppResult<i32> {
    if days < 0 {
        return Err(invalid_input_error("La garantía no puede ser negativa"));
    }
    Ok(days)
}

/// Campo opcional que, si viene, no puede quedar vacío
fn non_blank(value: Option<String>, field: &str) -> AppResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(invalid_input_error(format!("{} no puede estar vacío", field))),
        other => Ok(other),
    }
}
