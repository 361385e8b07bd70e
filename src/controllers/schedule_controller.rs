//! Controlador de schedules
//!
//! El destino de un schedule debe ser uno de los destinos de su plan.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::schedule_dto::{CreateScheduleRequest, ScheduleFilter, ScheduleResponse, TransporterSummary},
    middleware::{auth::Principal, request_meta::RequestMeta},
    models::{
        schedule::{Schedule, ScheduleQuery},
        user::Role,
    },
    state::AppState,
    utils::errors::{not_found_error, validation_error, AppResult},
};

pub struct ScheduleController {
    state: AppState,
}

impl ScheduleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateScheduleRequest,
    ) -> AppResult<Schedule> {
        let plan_id = request
            .plan
            .ok_or_else(|| validation_error("plan", "is required"))?;
        let plan = self
            .state
            .repositories
            .plans
            .find_by_id(plan_id)
            .await?
            .ok_or_else(|| not_found_error("Plan", &plan_id.to_string()))?;

        if !plan.offers_destination(&request.destination) {
            return Err(validation_error(
                "destination",
                "must be one of the plan's destinations",
            ));
        }

        let now = Utc::now();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            departure: request.departure.trim().to_string(),
            destination: request.destination.trim().to_string(),
            price: request.price.unwrap_or_default(),
            transporter_id: principal.user_id,
            time_slots: request.time_slots,
            created_at: now,
            updated_at: now,
        };

        let schedule = self.state.repositories.schedules.insert(schedule).await?;
        info!(
            "🚌 Schedule {} ({} → {}) created by {}",
            schedule.id, schedule.departure, schedule.destination, principal.email
        );
        Ok(schedule)
    }

    /// Un transportista autenticado sólo ve sus propios schedules
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        filter: ScheduleFilter,
    ) -> AppResult<Vec<Schedule>> {
        let transporter_id = match principal {
            Some(p) if p.role == Role::Transporter => Some(p.user_id),
            _ => filter.transporter,
        };
        let query = ScheduleQuery {
            plan_id: filter.plan,
            transporter_id,
            destination: filter.destination.filter(|d| !d.trim().is_empty()),
        };
        self.state.repositories.schedules.find_all(&query).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ScheduleResponse> {
        let repos = &self.state.repositories;
        let schedule = repos
            .schedules
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &id.to_string()))?;

        let plan = repos.plans.find_by_id(schedule.plan_id).await?;
        let transporter = repos
            .users
            .find_by_id(schedule.transporter_id)
            .await?
            .as_ref()
            .map(TransporterSummary::from);

        Ok(ScheduleResponse {
            schedule,
            plan,
            transporter,
        })
    }

    /// Borra el dueño o una autoridad
    pub async fn delete(&self, principal: &Principal, id: Uuid, meta: &RequestMeta) -> AppResult<()> {
        let repos = &self.state.repositories;
        let schedule = repos
            .schedules
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &id.to_string()))?;

        if principal.role != Role::Authority {
            self.state
                .authorization
                .require_owner(principal, schedule.transporter_id, meta, "schedule")
                .await?;
        }

        repos.schedules.delete(schedule.id).await?;
        info!("🗑️ Deleted schedule {}", schedule.id);
        Ok(())
    }
}
