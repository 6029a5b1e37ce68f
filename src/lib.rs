//! Taller workflow API
//!
//! Flujo de trabajo de un taller mecánico: estados del auto, ciclo de vida
//! de las solicitudes de servicio, autorización por rol y política de pagos
//! pendientes.

pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
pub mod workflow;

pub use routes::create_app;
pub use state::{AppState, Collaborators};
