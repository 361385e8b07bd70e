//! Repositorio del registro de actividad

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::activity_log::{Activity, ActivityLog, ActivityStatus, UserAgentInfo},
    utils::errors::AppResult,
};

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn insert(&self, entry: ActivityLog) -> AppResult<()>;
    /// Más recientes primero
    async fn find_recent(&self, limit: i64) -> AppResult<Vec<ActivityLog>>;
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityLogRow {
    id: Uuid,
    user_id: Option<Uuid>,
    activity_type: String,
    action: String,
    details: String,
    status: String,
    ip_address: String,
    browser: String,
    os: String,
    created_at: DateTime<Utc>,
}

impl From<ActivityLogRow> for ActivityLog {
    fn from(row: ActivityLogRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            activity: Activity {
                kind: row.activity_type,
                action: row.action,
            },
            details: row.details,
            status: ActivityStatus::from_str(&row.status).unwrap_or(ActivityStatus::Failure),
            ip_address: row.ip_address,
            user_agent: UserAgentInfo {
                browser: row.browser,
                os: row.os,
            },
            created_at: row.created_at,
        }
    }
}

pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn insert(&self, entry: ActivityLog) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, user_id, activity_type, action, details, status, ip_address, browser, os, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.activity.kind)
        .bind(&entry.activity.action)
        .bind(&entry.details)
        .bind(entry.status.as_str())
        .bind(&entry.ip_address)
        .bind(&entry.user_agent.browser)
        .bind(&entry.user_agent.os)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<ActivityLog>> {
        let rows = sqlx::query_as::<_, ActivityLogRow>(
            "SELECT * FROM activity_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityLog::from).collect())
    }
}
