//! Repositorios
//!
//! Cada entidad tiene un trait asíncrono con dos implementaciones:
//! PostgreSQL (`Pg*Repository`) y en memoria (`memory`). Ambas imponen las
//! mismas restricciones de unicidad.

pub mod activity_log_repository;
pub mod memory;
pub mod plan_repository;
pub mod schedule_repository;
pub mod travel_repository;
pub mod user_repository;

use std::sync::Arc;

use sqlx::PgPool;

use crate::utils::errors::AppError;

pub use activity_log_repository::{ActivityLogRepository, PgActivityLogRepository};
pub use plan_repository::{PgPlanRepository, PlanRepository};
pub use schedule_repository::{PgScheduleRepository, ScheduleRepository};
pub use travel_repository::{PgTravelRepository, TravelRepository};
pub use user_repository::{PgUserRepository, UserRepository};

/// Conjunto de repositorios compartido por los controladores
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub travels: Arc<dyn TravelRepository>,
    pub activity_logs: Arc<dyn ActivityLogRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            plans: Arc::new(PgPlanRepository::new(pool.clone())),
            schedules: Arc::new(PgScheduleRepository::new(pool.clone())),
            travels: Arc::new(PgTravelRepository::new(pool.clone())),
            activity_logs: Arc::new(PgActivityLogRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::InMemoryUserRepository::default()),
            plans: Arc::new(memory::InMemoryPlanRepository::default()),
            schedules: Arc::new(memory::InMemoryScheduleRepository::default()),
            travels: Arc::new(memory::InMemoryTravelRepository::default()),
            activity_logs: Arc::new(memory::InMemoryActivityLogRepository::default()),
        }
    }
}

/// Traducir violaciones de UNIQUE a `Conflict`; el resto queda como error de base de datos
pub(crate) fn map_unique_violation(error: sqlx::Error, message: impl Into<String>) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.into()),
        _ => AppError::Database(error),
    }
}

/// Escapar comodines de LIKE para búsquedas por subcadena
pub(crate) fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Huye"), "%Huye%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
