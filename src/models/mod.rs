//! Modelos del sistema
//!
//! Entidades del dominio: cuentas, planes, schedules, viajes y el
//! registro de actividad.

pub mod activity_log;
pub mod plan;
pub mod schedule;
pub mod travel;
pub mod user;
