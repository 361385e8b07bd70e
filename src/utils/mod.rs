//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! contraseñas y JWT.

pub mod errors;
pub mod jwt;
pub mod password;
pub mod validation;

pub use errors::{AppError, AppResult};
