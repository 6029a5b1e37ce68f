//! Store PostgreSQL
//!
//! Implementación de los repositorios con SQLx. Las transiciones se
//! confirman en una sola transacción SQL y cada escritura de estado se
//! condiciona al estado esperado.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{
    stale_state_error, CarRepository, CarWrite, CommitOutcome, DirectoryRepository,
    PaymentRepository, PendingInsert, RepairRepository, RequestWrite, ServiceRequestRepository,
    TransitionPlan, WorkflowRepository,
};
use crate::models::{
    Car, CarStatus, CarStatusChange, CarUpdate, Client, ClientContact, Mechanic, NewCar,
    NewPayment, Payment, PaymentStatus, Repair, RepairCorrection, RepairSummary, RequestStatus,
    ServiceRequest, UserAccount,
};
use crate::utils::errors::{invalid_state_error, not_found_error, AppError, AppResult};

const UNIQUE_VIOLATION: &str = "23505";

const CAR_COLUMNS: &str = "id, license_plate, brand, model, kms, chassis, description, status_id, priority, client_id, mechanic_id, created_at";
const REQUEST_COLUMNS: &str = "id, description, car_id, client_id, preferred_mechanic_id, assigned_boss_id, assigned_mechanic_id, status, created_at";
const REPAIR_COLUMNS: &str = "id, description, cost, warranty_days, car_id, mechanic_id, created_at";
const PAYMENT_COLUMNS: &str = "id, amount, method, status, external_reference, repair_id, client_id, created_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

fn corrupt_row(entity: &str, value: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Valor inválido en {}: {}", entity, value))
}

#[derive(Debug, FromRow)]
struct CarRow {
    id: Uuid,
    license_plate: String,
    brand: String,
    model: String,
    kms: i32,
    chassis: String,
    description: Option<String>,
    status_id: i16,
    priority: i32,
    client_id: Uuid,
    mechanic_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CarRow> for Car {
    type Error = AppError;

    fn try_from(row: CarRow) -> Result<Self, Self::Error> {
        let status = CarStatus::from_code(row.status_id)
            .ok_or_else(|| corrupt_row("cars.status_id", row.status_id))?;
        Ok(Car {
            id: row.id,
            license_plate: row.license_plate,
            brand: row.brand,
            model: row.model,
            kms: row.kms,
            chassis: row.chassis,
            description: row.description,
            status,
            priority: row.priority,
            client_id: row.client_id,
            mechanic_id: row.mechanic_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    car_id: Uuid,
    from_status: Option<i16>,
    to_status: i16,
    changed_by: Option<Uuid>,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for CarStatusChange {
    type Error = AppError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let from_status = match row.from_status {
            Some(code) => Some(
                CarStatus::from_code(code).ok_or_else(|| corrupt_row("from_status", code))?,
            ),
            None => None,
        };
        Ok(CarStatusChange {
            id: row.id,
            car_id: row.car_id,
            from_status,
            to_status: CarStatus::from_code(row.to_status)
                .ok_or_else(|| corrupt_row("to_status", row.to_status))?,
            changed_by: row.changed_by,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RequestRow {
    id: Uuid,
    description: String,
    car_id: Uuid,
    client_id: Uuid,
    preferred_mechanic_id: Option<Uuid>,
    assigned_boss_id: Uuid,
    assigned_mechanic_id: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for ServiceRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = RequestStatus::from_code(&row.status)
            .ok_or_else(|| corrupt_row("service_requests.status", &row.status))?;
        Ok(ServiceRequest {
            id: row.id,
            description: row.description,
            car_id: row.car_id,
            client_id: row.client_id,
            preferred_mechanic_id: row.preferred_mechanic_id,
            assigned_boss_id: row.assigned_boss_id,
            assigned_mechanic_id: row.assigned_mechanic_id,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RepairRow {
    id: Uuid,
    description: String,
    cost: Decimal,
    warranty_days: i32,
    car_id: Uuid,
    mechanic_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<RepairRow> for Repair {
    fn from(row: RepairRow) -> Self {
        Repair {
            id: row.id,
            description: row.description,
            cost: row.cost,
            warranty_days: row.warranty_days,
            car_id: row.car_id,
            mechanic_id: row.mechanic_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RepairSummaryRow {
    #[sqlx(flatten)]
    repair: RepairRow,
    license_plate: String,
    client_id: Uuid,
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    amount: Decimal,
    method: String,
    status: String,
    external_reference: Option<String>,
    repair_id: Uuid,
    client_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::from_code(&row.status)
            .ok_or_else(|| corrupt_row("payments.status", &row.status))?;
        Ok(Payment {
            id: row.id,
            amount: row.amount,
            method: row.method,
            status,
            external_reference: row.external_reference,
            repair_id: row.repair_id,
            client_id: row.client_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    last_name: String,
    email: String,
    role: String,
    active: bool,
    client_id: Option<Uuid>,
    mechanic_id: Option<Uuid>,
    boss_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        UserAccount {
            id: row.id,
            name: row.name,
            last_name: row.last_name,
            email: row.email,
            role: row.role,
            active: row.active,
            client_id: row.client_id,
            mechanic_id: row.mechanic_id,
            boss_id: row.boss_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ContactRow {
    name: String,
    last_name: String,
    email: String,
}

fn convert_all<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Store sobre un pool de PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_repair_summaries(
        &self,
        filter: &str,
        id: Option<Uuid>,
    ) -> AppResult<Vec<RepairSummary>> {
        let sql = format!(
            r#"
            SELECT r.id, r.description, r.cost, r.warranty_days, r.car_id, r.mechanic_id,
                   r.created_at, c.license_plate, c.client_id
            FROM repairs r
            JOIN cars c ON c.id = r.car_id
            WHERE {}
            ORDER BY r.created_at DESC
            "#,
            filter
        );
        let rows = sqlx::query_as::<_, RepairSummaryRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| RepairSummary {
                repair: row.repair.into(),
                license_plate: row.license_plate,
                client_id: row.client_id,
            })
            .collect())
    }

    async fn fetch_requests(&self, filter: &str, id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let sql = format!(
            "SELECT {} FROM service_requests WHERE {} = $1 ORDER BY created_at DESC",
            REQUEST_COLUMNS, filter
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn write_request(
        tx: &mut Transaction<'_, Postgres>,
        write: RequestWrite,
    ) -> AppResult<ServiceRequest> {
        match write {
            RequestWrite::Insert(request) => {
                let sql = format!(
                    "INSERT INTO service_requests ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
                    REQUEST_COLUMNS, REQUEST_COLUMNS
                );
                let row = sqlx::query_as::<_, RequestRow>(&sql)
                    .bind(request.id)
                    .bind(&request.description)
                    .bind(request.car_id)
                    .bind(request.client_id)
                    .bind(request.preferred_mechanic_id)
                    .bind(request.assigned_boss_id)
                    .bind(request.assigned_mechanic_id)
                    .bind(request.status.code())
                    .bind(request.created_at)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(|e| {
                        if is_unique_violation(&e) {
                            invalid_state_error("El auto ya tiene una solicitud de servicio en curso")
                        } else {
                            AppError::Database(e)
                        }
                    })?;
                row.try_into()
            }
            RequestWrite::Update {
                id,
                expected,
                status,
                assigned_mechanic_id,
            } => {
                let sql = format!(
                    "UPDATE service_requests SET status = $2, assigned_mechanic_id = $3 WHERE id = $1 AND status = $4 RETURNING {}",
                    REQUEST_COLUMNS
                );
                let row = sqlx::query_as::<_, RequestRow>(&sql)
                    .bind(id)
                    .bind(status.code())
                    .bind(assigned_mechanic_id)
                    .bind(expected.code())
                    .fetch_optional(&mut **tx)
                    .await?;
                match row {
                    Some(row) => row.try_into(),
                    None => Err(stale_state_error("la solicitud")),
                }
            }
        }
    }

    async fn write_car(
        tx: &mut Transaction<'_, Postgres>,
        write: CarWrite,
        now: DateTime<Utc>,
    ) -> AppResult<Car> {
        let current: Option<(i16,)> =
            sqlx::query_as("SELECT status_id FROM cars WHERE id = $1 FOR UPDATE")
                .bind(write.car_id)
                .fetch_optional(&mut **tx)
                .await?;
        let Some((current,)) = current else {
            return Err(not_found_error("Auto", write.car_id));
        };
        if current != write.expected.code() {
            return Err(stale_state_error("el auto"));
        }

        let mut previous = write.expected;
        for status in &write.writes {
            sqlx::query(
                "INSERT INTO car_status_history (id, car_id, from_status, to_status, changed_by, reason, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(Uuid::new_v4())
            .bind(write.car_id)
            .bind(previous.code())
            .bind(status.code())
            .bind(write.changed_by)
            .bind(&write.reason)
            .bind(now)
            .execute(&mut **tx)
            .await?;
            previous = *status;
        }

        let sql = format!(
            "UPDATE cars SET status_id = $2, mechanic_id = COALESCE($3, mechanic_id), description = COALESCE($4, description) WHERE id = $1 RETURNING {}",
            CAR_COLUMNS
        );
        let row = sqlx::query_as::<_, CarRow>(&sql)
            .bind(write.car_id)
            .bind(previous.code())
            .bind(write.mechanic_id)
            .bind(write.description)
            .fetch_one(&mut **tx)
            .await?;
        row.try_into()
    }
}

#[async_trait]
impl CarRepository for PgStore {
    async fn insert_car(&self, car: NewCar, now: DateTime<Utc>) -> AppResult<Car> {
        let car = car.into_car(now);
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO cars ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
            CAR_COLUMNS, CAR_COLUMNS
        );
        let row = sqlx::query_as::<_, CarRow>(&sql)
            .bind(car.id)
            .bind(&car.license_plate)
            .bind(&car.brand)
            .bind(&car.model)
            .bind(car.kms)
            .bind(&car.chassis)
            .bind(&car.description)
            .bind(car.status.code())
            .bind(car.priority)
            .bind(car.client_id)
            .bind(car.mechanic_id)
            .bind(car.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!(
                        "La patente {} ya está registrada",
                        car.license_plate
                    ))
                } else {
                    AppError::Database(e)
                }
            })?;

        sqlx::query(
            "INSERT INTO car_status_history (id, car_id, from_status, to_status, changed_by, reason, created_at) VALUES ($1, $2, NULL, $3, NULL, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(car.id)
        .bind(car.status.code())
        .bind("ingreso al taller")
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn find_car(&self, id: Uuid) -> AppResult<Option<Car>> {
        let sql = format!("SELECT {} FROM cars WHERE id = $1", CAR_COLUMNS);
        let row = sqlx::query_as::<_, CarRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Car::try_from).transpose()
    }

    async fn find_car_by_plate(&self, license_plate: &str) -> AppResult<Option<Car>> {
        let sql = format!("SELECT {} FROM cars WHERE license_plate = $1", CAR_COLUMNS);
        let row = sqlx::query_as::<_, CarRow>(&sql)
            .bind(license_plate)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Car::try_from).transpose()
    }

    async fn list_cars(&self) -> AppResult<Vec<Car>> {
        let sql = format!("SELECT {} FROM cars ORDER BY created_at DESC", CAR_COLUMNS);
        let rows = sqlx::query_as::<_, CarRow>(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn list_cars_by_client(&self, client_id: Uuid) -> AppResult<Vec<Car>> {
        let sql = format!(
            "SELECT {} FROM cars WHERE client_id = $1 ORDER BY created_at DESC",
            CAR_COLUMNS
        );
        let rows = sqlx::query_as::<_, CarRow>(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn car_history(&self, car_id: Uuid) -> AppResult<Vec<CarStatusChange>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT id, car_id, from_status, to_status, changed_by, reason, created_at FROM car_status_history WHERE car_id = $1 ORDER BY created_at, seq",
        )
        .bind(car_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn update_car(&self, id: Uuid, update: CarUpdate) -> AppResult<Car> {
        let sql = format!(
            r#"
            UPDATE cars SET
                license_plate = COALESCE($2, license_plate),
                brand = COALESCE($3, brand),
                model = COALESCE($4, model),
                kms = COALESCE($5, kms),
                chassis = COALESCE($6, chassis),
                description = COALESCE($7, description),
                priority = COALESCE($8, priority)
            WHERE id = $1
            RETURNING {}
            "#,
            CAR_COLUMNS
        );
        let row = sqlx::query_as::<_, CarRow>(&sql)
            .bind(id)
            .bind(&update.license_plate)
            .bind(&update.brand)
            .bind(&update.model)
            .bind(update.kms)
            .bind(&update.chassis)
            .bind(&update.description)
            .bind(update.priority)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!(
                        "La patente {} ya está registrada",
                        update.license_plate.as_deref().unwrap_or_default()
                    ))
                } else {
                    AppError::Database(e)
                }
            })?;

        row.ok_or_else(|| not_found_error("Auto", id))?.try_into()
    }

    async fn delete_car(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let (exists, in_use): (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM cars WHERE id = $1),
                EXISTS(SELECT 1 FROM repairs WHERE car_id = $1)
                    OR EXISTS(SELECT 1 FROM service_requests WHERE car_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            return Err(not_found_error("Auto", id));
        }
        if in_use {
            return Err(invalid_state_error(
                "No se puede eliminar un auto con reparaciones o solicitudes asociadas",
            ));
        }

        sqlx::query("DELETE FROM car_status_history WHERE car_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ServiceRequestRepository for PgStore {
    async fn find_request(&self, id: Uuid) -> AppResult<Option<ServiceRequest>> {
        let sql = format!("SELECT {} FROM service_requests WHERE id = $1", REQUEST_COLUMNS);
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ServiceRequest::try_from).transpose()
    }

    async fn list_requests_by_car(&self, car_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        self.fetch_requests("car_id", car_id).await
    }

    async fn list_requests_by_boss(&self, boss_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        self.fetch_requests("assigned_boss_id", boss_id).await
    }

    async fn list_requests_by_mechanic(&self, mechanic_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        self.fetch_requests("assigned_mechanic_id", mechanic_id).await
    }

    async fn list_requests_by_client(&self, client_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        self.fetch_requests("client_id", client_id).await
    }
}

#[async_trait]
impl RepairRepository for PgStore {
    async fn find_repair(&self, id: Uuid) -> AppResult<Option<Repair>> {
        let sql = format!("SELECT {} FROM repairs WHERE id = $1", REPAIR_COLUMNS);
        let row = sqlx::query_as::<_, RepairRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Repair::from))
    }

    async fn list_repairs(&self, client_id: Option<Uuid>) -> AppResult<Vec<RepairSummary>> {
        self.fetch_repair_summaries("$1::uuid IS NULL OR c.client_id = $1", client_id)
            .await
    }

    async fn list_repairs_by_mechanic(&self, mechanic_id: Uuid) -> AppResult<Vec<RepairSummary>> {
        self.fetch_repair_summaries("r.mechanic_id = $1", Some(mechanic_id))
            .await
    }

    async fn latest_repair_for_car(&self, car_id: Uuid) -> AppResult<Option<Repair>> {
        let sql = format!(
            "SELECT {} FROM repairs WHERE car_id = $1 ORDER BY created_at DESC LIMIT 1",
            REPAIR_COLUMNS
        );
        let row = sqlx::query_as::<_, RepairRow>(&sql)
            .bind(car_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Repair::from))
    }

    async fn update_repair(&self, id: Uuid, correction: RepairCorrection) -> AppResult<Repair> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM repairs WHERE id = $1 FOR UPDATE", REPAIR_COLUMNS);
        let current: Repair = sqlx::query_as::<_, RepairRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found_error("Reparación", id))?
            .into();

        if correction.changes_cost(&current) {
            let (has_payments,): (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM payments WHERE repair_id = $1 AND status <> $2)",
            )
            .bind(id)
            .bind(PaymentStatus::Cancelado.code())
            .fetch_one(&mut *tx)
            .await?;
            if has_payments {
                return Err(invalid_state_error(
                    "No se puede cambiar el costo de una reparación con pagos pendientes o realizados",
                ));
            }
        }

        let repair = correction.apply_to(current);
        sqlx::query("UPDATE repairs SET description = $2, cost = $3, warranty_days = $4 WHERE id = $1")
            .bind(id)
            .bind(&repair.description)
            .bind(repair.cost)
            .bind(repair.warranty_days)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(repair)
    }

    async fn delete_repair(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let (exists, has_payments): (bool, bool) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM repairs WHERE id = $1), EXISTS(SELECT 1 FROM payments WHERE repair_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            return Err(not_found_error("Reparación", id));
        }
        if has_payments {
            return Err(invalid_state_error(
                "No se puede eliminar una reparación con pagos asociados",
            ));
        }

        sqlx::query("DELETE FROM repairs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for PgStore {
    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>> {
        let sql = format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS);
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Payment::try_from).transpose()
    }

    async fn find_pending_payment(&self, repair_id: Uuid) -> AppResult<Option<Payment>> {
        let sql = format!(
            "SELECT {} FROM payments WHERE repair_id = $1 AND status = 'PENDIENTE'",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(repair_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Payment::try_from).transpose()
    }

    async fn insert_pending_payment(
        &self,
        payment: NewPayment,
        now: DateTime<Utc>,
    ) -> AppResult<PendingInsert> {
        let payment = payment.into_payment(now);
        // El índice parcial único sobre (repair_id) WHERE status = 'PENDIENTE'
        // decide la carrera entre dos intentos simultáneos
        let sql = format!(
            "INSERT INTO payments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (repair_id) WHERE status = 'PENDIENTE' DO NOTHING RETURNING {}",
            PAYMENT_COLUMNS, PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment.id)
            .bind(payment.amount)
            .bind(&payment.method)
            .bind(payment.status.code())
            .bind(&payment.external_reference)
            .bind(payment.repair_id)
            .bind(payment.client_id)
            .bind(payment.created_at)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(PendingInsert::Created(row.try_into()?));
        }

        match self.find_pending_payment(payment.repair_id).await? {
            Some(existing) => Ok(PendingInsert::AlreadyPending(existing)),
            None => Err(stale_state_error("el pago")),
        }
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>> {
        let sql = format!(
            "UPDATE payments SET status = $2 WHERE id = $1 AND status = $3 RETURNING {}",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(id)
            .bind(status.code())
            .bind(expected.code())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(Some(row.try_into()?));
        }

        if self.find_payment(id).await?.is_none() {
            return Err(not_found_error("Pago", id));
        }
        Ok(None)
    }
}

#[async_trait]
impl DirectoryRepository for PgStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.name, u.last_name, u.email, u.role, u.active, u.created_at,
                   c.id AS client_id, m.id AS mechanic_id, b.id AS boss_id
            FROM users u
            LEFT JOIN clients c ON c.user_id = u.id
            LEFT JOIN mechanics m ON m.user_id = u.id
            LEFT JOIN bosses b ON b.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserAccount::from))
    }

    async fn find_mechanic(&self, id: Uuid) -> AppResult<Option<Mechanic>> {
        let row: Option<(Uuid, Uuid, Option<Uuid>)> =
            sqlx::query_as("SELECT id, user_id, boss_id FROM mechanics WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, user_id, boss_id)| Mechanic {
            id,
            user_id,
            boss_id,
        }))
    }

    async fn list_boss_ids(&self) -> AppResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM bosses ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        let row: Option<(Uuid, Uuid)> =
            sqlx::query_as("SELECT id, user_id FROM clients WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, user_id)| Client { id, user_id }))
    }

    async fn find_client_contact(&self, client_id: Uuid) -> AppResult<Option<ClientContact>> {
        let row = sqlx::query_as::<_, ContactRow>(
            "SELECT u.name, u.last_name, u.email FROM clients c JOIN users u ON u.id = c.user_id WHERE c.id = $1",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| ClientContact {
            client_id,
            name: row.name,
            last_name: row.last_name,
            email: Some(row.email).filter(|email| !email.is_empty()),
        }))
    }
}

#[async_trait]
impl WorkflowRepository for PgStore {
    async fn commit(&self, plan: TransitionPlan) -> AppResult<CommitOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = CommitOutcome::default();

        if let Some(write) = plan.request {
            outcome.request = Some(Self::write_request(&mut tx, write).await?);
        }

        if let Some(write) = plan.car {
            outcome.car = Some(Self::write_car(&mut tx, write, plan.now).await?);
        }

        if let Some(repair) = plan.repair {
            let repair = repair.into_repair(plan.now);
            let sql = format!(
                "INSERT INTO repairs ({}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
                REPAIR_COLUMNS, REPAIR_COLUMNS
            );
            let row = sqlx::query_as::<_, RepairRow>(&sql)
                .bind(repair.id)
                .bind(&repair.description)
                .bind(repair.cost)
                .bind(repair.warranty_days)
                .bind(repair.car_id)
                .bind(repair.mechanic_id)
                .bind(repair.created_at)
                .fetch_one(&mut *tx)
                .await?;
            outcome.repair = Some(row.into());
        }

        // Un error antes de este punto descarta la transacción al soltarla
        tx.commit().await?;
        Ok(outcome)
    }
}
