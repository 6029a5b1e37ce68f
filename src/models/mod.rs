//! Modelos de datos
//!
//! Este módulo contiene las entidades del taller: autos, solicitudes de
//! servicio, reparaciones, pagos, usuarios y los registros de estados.

pub mod car;
pub mod payment;
pub mod repair;
pub mod service_request;
pub mod status;
pub mod user;

pub use car::*;
pub use payment::*;
pub use repair::*;
pub use service_request::*;
pub use status::*;
pub use user::*;
