//! Controladores
//!
//! Adaptan los DTOs de la API a los servicios y envuelven los resultados en
//! `ApiResponse`.

pub mod car_controller;
pub mod car_state_controller;
pub mod email_controller;
pub mod payment_controller;
pub mod repair_controller;
pub mod request_controller;
