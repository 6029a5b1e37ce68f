//! Store en memoria
//!
//! Implementación de los repositorios sobre un único `RwLock`: cada
//! transición toma el lock de escritura completo, así que se confirma de
//! forma atómica igual que en PostgreSQL. Se usa en tests y en ejecución
//! local sin `DATABASE_URL`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    stale_state_error, CarRepository, CommitOutcome, DirectoryRepository, PaymentRepository,
    PendingInsert, RepairRepository, RequestWrite, ServiceRequestRepository, TransitionPlan,
    WorkflowRepository,
};
use crate::models::{
    Boss, Car, CarStatusChange, CarUpdate, Client, ClientContact, Mechanic, NewCar, NewPayment,
    NewRepair, Payment, PaymentStatus, Repair, RepairCorrection, RepairSummary, ServiceRequest,
    UserAccount,
};
use crate::utils::errors::{invalid_state_error, not_found_error, AppError, AppResult};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserAccount>,
    clients: HashMap<Uuid, Client>,
    mechanics: HashMap<Uuid, Mechanic>,
    bosses: HashMap<Uuid, Boss>,
    cars: HashMap<Uuid, Car>,
    history: Vec<CarStatusChange>,
    requests: HashMap<Uuid, ServiceRequest>,
    repairs: HashMap<Uuid, Repair>,
    payments: HashMap<Uuid, Payment>,
}

impl MemoryState {
    fn has_live_request(&self, car_id: Uuid) -> bool {
        self.requests
            .values()
            .any(|request| request.car_id == car_id && !request.status.is_terminal())
    }

    fn repair_summaries<F>(&self, keep: F) -> Vec<RepairSummary>
    where
        F: Fn(&Repair, &Car) -> bool,
    {
        let summaries = self
            .repairs
            .values()
            .filter_map(|repair| {
                let car = self.cars.get(&repair.car_id)?;
                if !keep(repair, car) {
                    return None;
                }
                Some(RepairSummary {
                    repair: repair.clone(),
                    license_plate: car.license_plate.clone(),
                    client_id: car.client_id,
                })
            })
            .collect();
        newest_first(summaries, |summary| summary.repair.created_at)
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

/// Cuentas creadas por `with_demo_data`
#[derive(Debug, Clone)]
pub struct DemoAccounts {
    pub admin: UserAccount,
    pub receptionist: UserAccount,
    pub boss: UserAccount,
    pub mechanic: UserAccount,
    pub client: UserAccount,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store con un usuario por rol, para ejecución local
    pub async fn with_demo_data() -> (Self, DemoAccounts) {
        let store = Self::new();
        let admin = store.add_staff("Admin", "Taller", "admin@taller.com", "Admin").await;
        let receptionist = store
            .add_staff("Recepción", "Taller", "recepcion@taller.com", "Recepcionista")
            .await;
        let (boss, boss_profile) = store.add_boss("Jefe", "Mecánicos", "jefe@taller.com").await;
        let (mechanic, _) = store
            .add_mechanic("Mecánico", "Taller", "mecanico@taller.com", Some(boss_profile.id))
            .await;
        let (client, _) = store
            .add_client("Cliente", "Demo", Some("cliente@taller.com"))
            .await;

        info!("🧪 Store en memoria con datos de demo");
        (
            store,
            DemoAccounts {
                admin,
                receptionist,
                boss,
                mechanic,
                client,
            },
        )
    }

    fn new_user(name: &str, last_name: &str, email: &str, role: &str) -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            name: name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            active: true,
            client_id: None,
            mechanic_id: None,
            boss_id: None,
            created_at: Utc::now(),
        }
    }

    /// Usuario sin perfil (admin, recepcionista)
    pub async fn add_staff(&self, name: &str, last_name: &str, email: &str, role: &str) -> UserAccount {
        let user = Self::new_user(name, last_name, email, role);
        self.state.write().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn add_client(&self, name: &str, last_name: &str, email: Option<&str>) -> (UserAccount, Client) {
        let mut user = Self::new_user(name, last_name, email.unwrap_or_default(), "Cliente");
        let client = Client {
            id: Uuid::new_v4(),
            user_id: user.id,
        };
        user.client_id = Some(client.id);

        let mut state = self.state.write().await;
        state.users.insert(user.id, user.clone());
        state.clients.insert(client.id, client.clone());
        (user, client)
    }

    pub async fn add_boss(&self, name: &str, last_name: &str, email: &str) -> (UserAccount, Boss) {
        let mut user = Self::new_user(name, last_name, email, "Jefe");
        let boss = Boss {
            id: Uuid::new_v4(),
            user_id: user.id,
        };
        user.boss_id = Some(boss.id);

        let mut state = self.state.write().await;
        state.users.insert(user.id, user.clone());
        state.bosses.insert(boss.id, boss.clone());
        (user, boss)
    }

    pub async fn add_mechanic(
        &self,
        name: &str,
        last_name: &str,
        email: &str,
        boss_id: Option<Uuid>,
    ) -> (UserAccount, Mechanic) {
        let mut user = Self::new_user(name, last_name, email, "Mecánico");
        let mechanic = Mechanic {
            id: Uuid::new_v4(),
            user_id: user.id,
            boss_id,
        };
        user.mechanic_id = Some(mechanic.id);

        let mut state = self.state.write().await;
        state.users.insert(user.id, user.clone());
        state.mechanics.insert(mechanic.id, mechanic.clone());
        (user, mechanic)
    }

    pub async fn set_user_active(&self, user_id: Uuid, active: bool) {
        if let Some(user) = self.state.write().await.users.get_mut(&user_id) {
            user.active = active;
        }
    }

    /// Registrar una reparación fuera del flujo (datos iniciales, tests)
    pub async fn seed_repair(&self, repair: NewRepair) -> Repair {
        let repair = repair.into_repair(Utc::now());
        self.state.write().await.repairs.insert(repair.id, repair.clone());
        repair
    }

    /// Registrar un pago con fecha arbitraria (datos iniciales, tests)
    pub async fn seed_payment(&self, payment: Payment) {
        self.state.write().await.payments.insert(payment.id, payment);
    }

    pub async fn payments_for_repair(&self, repair_id: Uuid) -> Vec<Payment> {
        let state = self.state.read().await;
        let payments = state
            .payments
            .values()
            .filter(|payment| payment.repair_id == repair_id)
            .cloned()
            .collect();
        newest_first(payments, |payment| payment.created_at)
    }

    pub async fn repairs_for_car(&self, car_id: Uuid) -> Vec<Repair> {
        let state = self.state.read().await;
        let repairs = state
            .repairs
            .values()
            .filter(|repair| repair.car_id == car_id)
            .cloned()
            .collect();
        newest_first(repairs, |repair| repair.created_at)
    }
}

#[async_trait]
impl CarRepository for MemoryStore {
    async fn insert_car(&self, car: NewCar, now: DateTime<Utc>) -> AppResult<Car> {
        let mut state = self.state.write().await;
        if state
            .cars
            .values()
            .any(|existing| existing.license_plate == car.license_plate)
        {
            return Err(AppError::Conflict(format!(
                "La patente {} ya está registrada",
                car.license_plate
            )));
        }

        let car = car.into_car(now);
        state.history.push(CarStatusChange {
            id: Uuid::new_v4(),
            car_id: car.id,
            from_status: None,
            to_status: car.status,
            changed_by: None,
            reason: Some("ingreso al taller".to_string()),
            created_at: now,
        });
        state.cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn find_car(&self, id: Uuid) -> AppResult<Option<Car>> {
        Ok(self.state.read().await.cars.get(&id).cloned())
    }

    async fn find_car_by_plate(&self, license_plate: &str) -> AppResult<Option<Car>> {
        Ok(self
            .state
            .read()
            .await
            .cars
            .values()
            .find(|car| car.license_plate == license_plate)
            .cloned())
    }

    async fn list_cars(&self) -> AppResult<Vec<Car>> {
        let cars = self.state.read().await.cars.values().cloned().collect();
        Ok(newest_first(cars, |car| car.created_at))
    }

    async fn list_cars_by_client(&self, client_id: Uuid) -> AppResult<Vec<Car>> {
        let cars = self
            .state
            .read()
            .await
            .cars
            .values()
            .filter(|car| car.client_id == client_id)
            .cloned()
            .collect();
        Ok(newest_first(cars, |car| car.created_at))
    }

    async fn car_history(&self, car_id: Uuid) -> AppResult<Vec<CarStatusChange>> {
        Ok(self
            .state
            .read()
            .await
            .history
            .iter()
            .filter(|change| change.car_id == car_id)
            .cloned()
            .collect())
    }

    async fn update_car(&self, id: Uuid, update: CarUpdate) -> AppResult<Car> {
        let mut state = self.state.write().await;
        let car = state
            .cars
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error("Auto", id))?;
        if let Some(plate) = &update.license_plate {
            if state
                .cars
                .values()
                .any(|other| other.id != id && &other.license_plate == plate)
            {
                return Err(AppError::Conflict(format!(
                    "La patente {} ya está registrada",
                    plate
                )));
            }
        }

        let car = update.apply_to(car);
        state.cars.insert(id, car.clone());
        Ok(car)
    }

    async fn delete_car(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.cars.contains_key(&id) {
            return Err(not_found_error("Auto", id));
        }
        if state.repairs.values().any(|repair| repair.car_id == id)
            || state.requests.values().any(|request| request.car_id == id)
        {
            return Err(invalid_state_error(
                "No se puede eliminar un auto con reparaciones o solicitudes asociadas",
            ));
        }

        state.cars.remove(&id);
        state.history.retain(|change| change.car_id != id);
        Ok(())
    }
}

#[async_trait]
impl ServiceRequestRepository for MemoryStore {
    async fn find_request(&self, id: Uuid) -> AppResult<Option<ServiceRequest>> {
        Ok(self.state.read().await.requests.get(&id).cloned())
    }

    async fn list_requests_by_car(&self, car_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let requests = self
            .state
            .read()
            .await
            .requests
            .values()
            .filter(|request| request.car_id == car_id)
            .cloned()
            .collect();
        Ok(newest_first(requests, |request| request.created_at))
    }

    async fn list_requests_by_boss(&self, boss_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let requests = self
            .state
            .read()
            .await
            .requests
            .values()
            .filter(|request| request.assigned_boss_id == boss_id)
            .cloned()
            .collect();
        Ok(newest_first(requests, |request| request.created_at))
    }

    async fn list_requests_by_mechanic(&self, mechanic_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let requests = self
            .state
            .read()
            .await
            .requests
            .values()
            .filter(|request| request.assigned_mechanic_id == Some(mechanic_id))
            .cloned()
            .collect();
        Ok(newest_first(requests, |request| request.created_at))
    }

    async fn list_requests_by_client(&self, client_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let requests = self
            .state
            .read()
            .await
            .requests
            .values()
            .filter(|request| request.client_id == client_id)
            .cloned()
            .collect();
        Ok(newest_first(requests, |request| request.created_at))
    }
}

#[async_trait]
impl RepairRepository for MemoryStore {
    async fn find_repair(&self, id: Uuid) -> AppResult<Option<Repair>> {
        Ok(self.state.read().await.repairs.get(&id).cloned())
    }

    async fn list_repairs(&self, client_id: Option<Uuid>) -> AppResult<Vec<RepairSummary>> {
        let state = self.state.read().await;
        Ok(state.repair_summaries(|_, car| {
            client_id.map_or(true, |client_id| car.client_id == client_id)
        }))
    }

    async fn list_repairs_by_mechanic(&self, mechanic_id: Uuid) -> AppResult<Vec<RepairSummary>> {
        let state = self.state.read().await;
        Ok(state.repair_summaries(|repair, _| repair.mechanic_id == Some(mechanic_id)))
    }

    async fn latest_repair_for_car(&self, car_id: Uuid) -> AppResult<Option<Repair>> {
        Ok(self
            .state
            .read()
            .await
            .repairs
            .values()
            .filter(|repair| repair.car_id == car_id)
            .max_by_key(|repair| repair.created_at)
            .cloned())
    }

    async fn update_repair(&self, id: Uuid, correction: RepairCorrection) -> AppResult<Repair> {
        let mut state = self.state.write().await;
        let repair = state
            .repairs
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_error("Reparación", id))?;
        if correction.changes_cost(&repair)
            && state
                .payments
                .values()
                .any(|payment| payment.repair_id == id && payment.status != PaymentStatus::Cancelado)
        {
            return Err(invalid_state_error(
                "No se puede cambiar el costo de una reparación con pagos pendientes o realizados",
            ));
        }

        let repair = correction.apply_to(repair);
        state.repairs.insert(id, repair.clone());
        Ok(repair)
    }

    async fn delete_repair(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.repairs.contains_key(&id) {
            return Err(not_found_error("Reparación", id));
        }
        if state.payments.values().any(|payment| payment.repair_id == id) {
            return Err(invalid_state_error(
                "No se puede eliminar una reparación con pagos asociados",
            ));
        }
        state.repairs.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>> {
        Ok(self.state.read().await.payments.get(&id).cloned())
    }

    async fn find_pending_payment(&self, repair_id: Uuid) -> AppResult<Option<Payment>> {
        Ok(self
            .state
            .read()
            .await
            .payments
            .values()
            .find(|payment| {
                payment.repair_id == repair_id && payment.status == PaymentStatus::Pendiente
            })
            .cloned())
    }

    async fn insert_pending_payment(
        &self,
        payment: NewPayment,
        now: DateTime<Utc>,
    ) -> AppResult<PendingInsert> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.payments.values().find(|existing| {
            existing.repair_id == payment.repair_id && existing.status == PaymentStatus::Pendiente
        }) {
            return Ok(PendingInsert::AlreadyPending(existing.clone()));
        }

        let payment = payment.into_payment(now);
        state.payments.insert(payment.id, payment.clone());
        Ok(PendingInsert::Created(payment))
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>> {
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Pago", id))?;
        if payment.status != expected {
            return Ok(None);
        }
        payment.status = status;
        Ok(Some(payment.clone()))
    }
}

#[async_trait]
impl DirectoryRepository for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<UserAccount>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_mechanic(&self, id: Uuid) -> AppResult<Option<Mechanic>> {
        Ok(self.state.read().await.mechanics.get(&id).cloned())
    }

    async fn list_boss_ids(&self) -> AppResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self.state.read().await.bosses.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn find_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        Ok(self.state.read().await.clients.get(&id).cloned())
    }

    async fn find_client_contact(&self, client_id: Uuid) -> AppResult<Option<ClientContact>> {
        let state = self.state.read().await;
        let Some(client) = state.clients.get(&client_id) else {
            return Ok(None);
        };
        Ok(state.users.get(&client.user_id).map(|user| ClientContact {
            client_id,
            name: user.name.clone(),
            last_name: user.last_name.clone(),
            email: Some(user.email.clone()).filter(|email| !email.is_empty()),
        }))
    }
}

#[async_trait]
impl WorkflowRepository for MemoryStore {
    async fn commit(&self, plan: TransitionPlan) -> AppResult<CommitOutcome> {
        let mut state = self.state.write().await;

        // Validar todo antes de escribir
        match &plan.request {
            Some(RequestWrite::Update { id, expected, .. }) => {
                let current = state
                    .requests
                    .get(id)
                    .ok_or_else(|| not_found_error("Solicitud", id))?;
                if current.status != *expected {
                    return Err(stale_state_error("la solicitud"));
                }
            }
            Some(RequestWrite::Insert(request)) => {
                if state.has_live_request(request.car_id) {
                    return Err(invalid_state_error(
                        "El auto ya tiene una solicitud de servicio en curso",
                    ));
                }
            }
            None => {}
        }

        if let Some(car_write) = &plan.car {
            let car = state
                .cars
                .get(&car_write.car_id)
                .ok_or_else(|| not_found_error("Auto", car_write.car_id))?;
            if car.status != car_write.expected {
                return Err(stale_state_error("el auto"));
            }
        }

        let mut outcome = CommitOutcome::default();

        match plan.request {
            Some(RequestWrite::Insert(request)) => {
                state.requests.insert(request.id, request.clone());
                outcome.request = Some(request);
            }
            Some(RequestWrite::Update {
                id,
                status,
                assigned_mechanic_id,
                ..
            }) => {
                if let Some(request) = state.requests.get_mut(&id) {
                    request.status = status;
                    request.assigned_mechanic_id = assigned_mechanic_id;
                    outcome.request = Some(request.clone());
                }
            }
            None => {}
        }

        if let Some(car_write) = plan.car {
            let mut changes = Vec::with_capacity(car_write.writes.len());
            if let Some(car) = state.cars.get_mut(&car_write.car_id) {
                for status in &car_write.writes {
                    changes.push(CarStatusChange {
                        id: Uuid::new_v4(),
                        car_id: car.id,
                        from_status: Some(car.status),
                        to_status: *status,
                        changed_by: car_write.changed_by,
                        reason: car_write.reason.clone(),
                        created_at: plan.now,
                    });
                    car.status = *status;
                }
                if let Some(mechanic_id) = car_write.mechanic_id {
                    car.mechanic_id = Some(mechanic_id);
                }
                if let Some(description) = car_write.description {
                    car.description = Some(description);
                }
                outcome.car = Some(car.clone());
            }
            state.history.extend(changes);
        }

        if let Some(repair) = plan.repair {
            let repair = repair.into_repair(plan.now);
            state.repairs.insert(repair.id, repair.clone());
            outcome.repair = Some(repair);
        }

        Ok(outcome)
    }
}
