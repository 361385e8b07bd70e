//! Repositorio de schedules

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    models::schedule::{Schedule, ScheduleQuery, TimeSlot},
    repositories::like_pattern,
    utils::errors::AppResult,
};

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn insert(&self, schedule: Schedule) -> AppResult<Schedule>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Schedule>>;
    async fn find_all(&self, query: &ScheduleQuery) -> AppResult<Vec<Schedule>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    plan_id: Uuid,
    departure: String,
    destination: String,
    price: i64,
    transporter_id: Uuid,
    time_slots: Json<Vec<TimeSlot>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ScheduleRow> for Schedule {
    fn from(row: ScheduleRow) -> Self {
        Self {
            id: row.id,
            plan_id: row.plan_id,
            departure: row.departure,
            destination: row.destination,
            price: row.price,
            transporter_id: row.transporter_id,
            time_slots: row.time_slots.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn insert(&self, schedule: Schedule) -> AppResult<Schedule> {
        sqlx::query(
            r#"
            INSERT INTO schedules (id, plan_id, departure, destination, price, transporter_id, time_slots, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.plan_id)
        .bind(&schedule.departure)
        .bind(&schedule.destination)
        .bind(schedule.price)
        .bind(schedule.transporter_id)
        .bind(Json(&schedule.time_slots))
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(schedule)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Schedule>> {
        let row = sqlx::query_as::<_, ScheduleRow>("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Schedule::from))
    }

    async fn find_all(&self, query: &ScheduleQuery) -> AppResult<Vec<Schedule>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM schedules WHERE 1 = 1");

        if let Some(plan_id) = query.plan_id {
            builder.push(" AND plan_id = ").push_bind(plan_id);
        }
        if let Some(transporter_id) = query.transporter_id {
            builder.push(" AND transporter_id = ").push_bind(transporter_id);
        }
        if let Some(destination) = &query.destination {
            builder
                .push(" AND destination ILIKE ")
                .push_bind(like_pattern(destination));
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder
            .build_query_as::<ScheduleRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
