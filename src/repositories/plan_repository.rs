//! Repositorio de planes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::plan::{Plan, Province},
    utils::errors::AppResult,
};

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn insert(&self, plan: Plan) -> AppResult<Plan>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>>;
    async fn find_all(&self) -> AppResult<Vec<Plan>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    date: DateTime<Utc>,
    destinations: Vec<String>,
    province: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            destinations: row.destinations,
            province: row.province.as_deref().and_then(Province::from_str),
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn insert(&self, plan: Plan) -> AppResult<Plan> {
        sqlx::query(
            r#"
            INSERT INTO plans (id, date, destinations, province, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(plan.id)
        .bind(plan.date)
        .bind(&plan.destinations)
        .bind(plan.province.map(|p| p.as_str()))
        .bind(plan.created_by)
        .bind(plan.created_at)
        .execute(&self.pool)
        .await?;

        Ok(plan)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>("SELECT * FROM plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Plan::from))
    }

    async fn find_all(&self) -> AppResult<Vec<Plan>> {
        let rows = sqlx::query_as::<_, PlanRow>("SELECT * FROM plans ORDER BY date DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Plan::from).collect())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
