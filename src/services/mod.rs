//! Services module
//!
//! Integraciones externas (gateway de pago, SMTP) y servicios de dominio
//! que usan los controladores: autorización, notificaciones, espera del
//! pago y numeración de viajes.

pub mod authorization_service;
pub mod email_service;
pub mod email_templates;
pub mod notification_service;
pub mod payment_gateway;
pub mod payment_poller;
pub mod paypack_client;
pub mod travel_number;

pub use authorization_service::AuthorizationService;
pub use notification_service::{DispatchMode, Notifier};
pub use payment_gateway::PaymentGateway;
