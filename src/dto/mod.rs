//! DTOs de entrada y salida de la API

pub mod api_response;
pub mod car_dto;
pub mod email_dto;
pub mod payment_dto;
pub mod repair_dto;
pub mod request_dto;

pub use api_response::ApiResponse;
