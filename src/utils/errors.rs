//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Datos del pago pendiente que bloquea la creación de uno nuevo
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPaymentConflict {
    pub existing_payment_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub can_cancel_after: DateTime<Utc>,
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Duplicate pending payment: {}", .0.existing_payment_id)]
    DuplicatePendingPayment(PendingPaymentConflict),

    #[error("No boss available to route the request")]
    NoBossAvailable,

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Código estable que viaja en el cuerpo de la respuesta
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Validation(_) | AppError::InvalidInput(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) | AppError::Jwt(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::DuplicatePendingPayment(_) => "DUPLICATE_PENDING_PAYMENT",
            AppError::NoBossAvailable => "NO_BOSS_AVAILABLE",
            AppError::ExternalApi(_) => "EXTERNAL_API_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::InvalidState(_)
            | AppError::DuplicatePendingPayment(_) => StatusCode::CONFLICT,
            AppError::NoBossAvailable => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let (error, message, details) = match self {
            AppError::Database(e) => {
                error!("❌ Error de base de datos: {}", e);
                (
                    "Internal Server Error",
                    "Error interno del servidor".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                error!("❌ Error interno: {}", msg);
                (
                    "Internal Server Error",
                    "Error interno del servidor".to_string(),
                    None,
                )
            }
            AppError::Validation(e) => {
                warn!("⚠️ Error de validación: {}", e);
                (
                    "Validation Error",
                    "Datos de entrada inválidos".to_string(),
                    Some(json!(e)),
                )
            }
            AppError::InvalidInput(msg) => ("Validation Error", msg, None),
            AppError::Unauthorized(msg) => ("Unauthorized", msg, None),
            AppError::Jwt(msg) => ("Unauthorized", msg, None),
            AppError::Forbidden(msg) => {
                warn!("🚫 Acceso denegado: {}", msg);
                ("Forbidden", msg, None)
            }
            AppError::NotFound(msg) => ("Not Found", msg, None),
            AppError::Conflict(msg) => ("Conflict", msg, None),
            AppError::InvalidState(msg) => ("Invalid State", msg, None),
            AppError::DuplicatePendingPayment(conflict) => (
                "Duplicate Pending Payment",
                "Ya existe un pago pendiente para esta reparación. Complete o cancele el pago existente antes de crear uno nuevo.".to_string(),
                Some(json!(conflict)),
            ),
            AppError::NoBossAvailable => (
                "No Boss Available",
                "No hay jefes disponibles".to_string(),
                None,
            ),
            AppError::ExternalApi(msg) => {
                error!("❌ Error de API externa: {}", msg);
                (
                    "External API Error",
                    "Error comunicándose con el proveedor externo".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: error.to_string(),
            message,
            code,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} con id '{}' no encontrado", resource, id))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("No puedes {}: {}", operation, reason))
}

/// Función helper para crear errores de estado inválido
pub fn invalid_state_error(message: impl Into<String>) -> AppError {
    AppError::InvalidState(message.into())
}

/// Función helper para crear errores de entrada inválida
pub fn invalid_input_error(message: impl Into<String>) -> AppError {
    AppError::InvalidInput(message.into())
}
