//! Middleware de autenticación JWT
//!
//! Este módulo maneja la autenticación JWT: extrae el token, carga el
//! usuario desde el store y lo inyecta en la request como `Actor`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::Actor,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de acceso requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.jwt)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Token inválido".to_string()))?;

    // El rol y los perfiles se leen del store en cada request
    let user = state
        .store
        .find_user(user_id)
        .await?
        .filter(|user| user.active)
        .ok_or_else(|| AppError::Unauthorized("Usuario no válido o inactivo".to_string()))?;

    debug!("🔐 {} autenticado como {}", user.email, user.role);
    request.extensions_mut().insert(Actor::from(&user));

    Ok(next.run(request).await)
}
