//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: el flujo de
//! trabajo del taller, los pagos y las notificaciones.

pub mod notification_service;
pub mod payment_provider;
pub mod payment_service;
pub mod workflow_service;

pub use notification_service::{DispatchMode, NotificationDispatcher, NotificationHub, QueueNotifier};
pub use payment_provider::{provider_from_config, PaymentProvider, Preference, PreferenceOrder};
pub use payment_service::{PaymentCheckout, PaymentService, PendingPaymentView};
pub use workflow_service::{
    DirectRepair, FinishedRepair, OpenRequest, RequestDetail, RequestOutcome, WorkflowService,
};
