//! Middleware de la aplicación
//!
//! Autenticación JWT, control de roles, metadatos de petición y CORS.

pub mod auth;
pub mod cors;
pub mod request_meta;

pub use auth::{authenticate, guarded, restrict_to, Principal};
pub use cors::cors_middleware;
pub use request_meta::RequestMeta;
