//! Rutas de la API
//!
//! Un router por recurso; `create_app` los anida bajo `/api` detrás del
//! middleware de autenticación.

pub mod car_routes;
pub mod car_state_routes;
pub mod email_routes;
pub mod payment_routes;
pub mod repair_routes;
pub mod request_routes;

use axum::{middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth_middleware, cors_layer};
use crate::state::AppState;

/// Router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/cars", car_routes::create_car_router())
        .nest("/car-states", car_state_routes::create_car_state_router())
        .nest("/requests", request_routes::create_request_router())
        .nest("/repairs", repair_routes::create_repair_router())
        .nest("/payments", payment_routes::create_payment_router())
        .nest("/email", email_routes::create_email_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/test", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Taller API funcionando",
        "timestamp": chrono::Utc::now(),
    }))
}
