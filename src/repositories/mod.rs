//! Repositorios
//!
//! Contratos de acceso a datos del taller. El flujo de trabajo depende sólo de
//! estos traits; hay dos implementaciones: `PgStore` (PostgreSQL vía SQLx) y
//! `MemoryStore` (tests y ejecución local sin base de datos).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Car, CarStatus, CarStatusChange, CarUpdate, Client, ClientContact, Mechanic, NewCar,
    NewPayment, NewRepair, Payment, PaymentStatus, Repair, RepairCorrection, RepairSummary,
    RequestStatus, ServiceRequest, UserAccount,
};
use crate::utils::errors::{invalid_state_error, AppError, AppResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CarRepository: Send + Sync {
    /// Alta de un auto en estado Entrada. Patente duplicada → `Conflict`.
    async fn insert_car(&self, car: NewCar, now: DateTime<Utc>) -> AppResult<Car>;
    async fn find_car(&self, id: Uuid) -> AppResult<Option<Car>>;
    async fn find_car_by_plate(&self, license_plate: &str) -> AppResult<Option<Car>>;
    async fn list_cars(&self) -> AppResult<Vec<Car>>;
    async fn list_cars_by_client(&self, client_id: Uuid) -> AppResult<Vec<Car>>;
    async fn car_history(&self, car_id: Uuid) -> AppResult<Vec<CarStatusChange>>;
    /// Edición de datos. Patente tomada por otro auto → `Conflict`.
    async fn update_car(&self, id: Uuid, update: CarUpdate) -> AppResult<Car>;
    /// Bloqueado con `InvalidState` mientras existan reparaciones o solicitudes
    async fn delete_car(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    async fn find_request(&self, id: Uuid) -> AppResult<Option<ServiceRequest>>;
    async fn list_requests_by_car(&self, car_id: Uuid) -> AppResult<Vec<ServiceRequest>>;
    async fn list_requests_by_boss(&self, boss_id: Uuid) -> AppResult<Vec<ServiceRequest>>;
    async fn list_requests_by_mechanic(&self, mechanic_id: Uuid) -> AppResult<Vec<ServiceRequest>>;
    async fn list_requests_by_client(&self, client_id: Uuid) -> AppResult<Vec<ServiceRequest>>;
}

#[async_trait]
pub trait RepairRepository: Send + Sync {
    async fn find_repair(&self, id: Uuid) -> AppResult<Option<Repair>>;
    /// Todas las reparaciones, o sólo las de los autos de un cliente
    async fn list_repairs(&self, client_id: Option<Uuid>) -> AppResult<Vec<RepairSummary>>;
    async fn list_repairs_by_mechanic(&self, mechanic_id: Uuid) -> AppResult<Vec<RepairSummary>>;
    async fn latest_repair_for_car(&self, car_id: Uuid) -> AppResult<Option<Repair>>;
    /// El costo no cambia si hay pagos pendientes o pagados (`InvalidState`)
    async fn update_repair(&self, id: Uuid, correction: RepairCorrection) -> AppResult<Repair>;
    /// Bloqueado con `InvalidState` si algún pago la referencia
    async fn delete_repair(&self, id: Uuid) -> AppResult<()>;
}

/// Resultado de intentar registrar un pago pendiente
#[derive(Debug, Clone)]
pub enum PendingInsert {
    Created(Payment),
    /// Otro pendiente ganó la carrera; se devuelve el existente
    AlreadyPending(Payment),
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>>;
    async fn find_pending_payment(&self, repair_id: Uuid) -> AppResult<Option<Payment>>;
    async fn insert_pending_payment(
        &self,
        payment: NewPayment,
        now: DateTime<Utc>,
    ) -> AppResult<PendingInsert>;
    /// Cambio de estado condicionado al estado esperado. `None` si el pago ya
    /// no estaba en `expected`.
    async fn update_payment_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>>;
}

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<UserAccount>>;
    async fn find_mechanic(&self, id: Uuid) -> AppResult<Option<Mechanic>>;
    async fn list_boss_ids(&self) -> AppResult<Vec<Uuid>>;
    async fn find_client(&self, id: Uuid) -> AppResult<Option<Client>>;
    async fn find_client_contact(&self, client_id: Uuid) -> AppResult<Option<ClientContact>>;
}

/// Escritura sobre la solicitud dentro de una transición
#[derive(Debug, Clone)]
pub enum RequestWrite {
    Insert(ServiceRequest),
    Update {
        id: Uuid,
        expected: RequestStatus,
        status: RequestStatus,
        assigned_mechanic_id: Option<Uuid>,
    },
}

/// Escritura sobre el auto: una o más escrituras de estado, en orden
#[derive(Debug, Clone)]
pub struct CarWrite {
    pub car_id: Uuid,
    pub expected: CarStatus,
    pub writes: Vec<CarStatus>,
    pub mechanic_id: Option<Uuid>,
    pub description: Option<String>,
    pub changed_by: Option<Uuid>,
    pub reason: Option<String>,
}

/// Unidad de trabajo de una transición. Se confirma entera o nada; cada
/// escritura verifica el estado esperado (compare-and-swap).
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub request: Option<RequestWrite>,
    pub car: Option<CarWrite>,
    pub repair: Option<NewRepair>,
    pub now: DateTime<Utc>,
}

impl TransitionPlan {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            request: None,
            car: None,
            repair: None,
            now,
        }
    }
}

/// Filas resultantes de una transición confirmada
#[derive(Debug, Clone, Default)]
pub struct CommitOutcome {
    pub request: Option<ServiceRequest>,
    pub car: Option<Car>,
    pub repair: Option<Repair>,
}

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn commit(&self, plan: TransitionPlan) -> AppResult<CommitOutcome>;
}

/// Store completo que se inyecta en los servicios
pub trait Store:
    CarRepository
    + ServiceRequestRepository
    + RepairRepository
    + PaymentRepository
    + DirectoryRepository
    + WorkflowRepository
{
}

impl<T> Store for T where
    T: CarRepository
        + ServiceRequestRepository
        + RepairRepository
        + PaymentRepository
        + DirectoryRepository
        + WorkflowRepository
{
}

/// Error de carrera perdida: el estado cambió entre la lectura y la escritura
pub(crate) fn stale_state_error(entity: &str) -> AppError {
    invalid_state_error(format!(
        "El estado de {} cambió mientras se procesaba la operación",
        entity
    ))
}
