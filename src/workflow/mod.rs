//! Núcleo del flujo de trabajo del taller
//!
//! Resolución de roles, gate de autorización, máquinas de estados del auto y
//! de la solicitud de servicio, y la política de pagos pendientes. Todo es
//! lógica pura: la persistencia y las notificaciones viven en `services`.

pub mod authorization;
pub mod car_machine;
pub mod payment_policy;
pub mod request_machine;
pub mod roles;

pub use car_machine::{CarTransition, CarTrigger};
pub use payment_policy::PendingDecision;
pub use request_machine::{RequestTransition, RequestTrigger};
