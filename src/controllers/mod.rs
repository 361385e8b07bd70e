//! Controladores
//!
//! Lógica de cada recurso sobre `AppState`. Las rutas sólo extraen la
//! petición y delegan aquí.

pub mod auth_controller;
pub mod plan_controller;
pub mod schedule_controller;
pub mod travel_controller;
pub mod user_controller;
