//! Controlador de planes

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::plan_dto::{parse_plan_date, CreatePlanRequest},
    middleware::auth::Principal,
    models::{
        plan::Plan,
        schedule::{Schedule, ScheduleQuery},
    },
    state::AppState,
    utils::errors::{not_found_error, validation_error, AppResult},
};

pub struct PlanController {
    state: AppState,
}

impl PlanController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn create(&self, principal: &Principal, request: CreatePlanRequest) -> AppResult<Plan> {
        let date = parse_plan_date(&request.date)
            .ok_or_else(|| validation_error("date", "must be a valid date"))?;

        let plan = Plan {
            id: Uuid::new_v4(),
            date,
            destinations: request
                .destinations
                .iter()
                .map(|d| d.trim().to_string())
                .collect(),
            province: request.province,
            created_by: Some(principal.user_id),
            created_at: Utc::now(),
        };

        let plan = self.state.repositories.plans.insert(plan).await?;
        info!("🗓️ Plan {} created by {}", plan.id, principal.email);
        Ok(plan)
    }

    pub async fn list(&self) -> AppResult<Vec<Plan>> {
        self.state.repositories.plans.find_all().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Plan> {
        self.state
            .repositories
            .plans
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Plan", &id.to_string()))
    }

    pub async fn schedules(&self, id: Uuid) -> AppResult<Vec<Schedule>> {
        let plan = self.get(id).await?;
        self.state
            .repositories
            .schedules
            .find_all(&ScheduleQuery {
                plan_id: Some(plan.id),
                ..Default::default()
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.state.repositories.plans.delete(id).await? {
            return Err(not_found_error("Plan", &id.to_string()));
        }
        info!("🗑️ Deleted plan {}", id);
        Ok(())
    }
}
