use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::dto::ApiResponse;
use crate::middleware::auth::guarded;
use crate::models::{activity_log::ActivityLog, user::Role};
use crate::state::AppState;
use crate::utils::errors::AppError;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

pub fn create_activity_log_router(state: &AppState) -> Router<AppState> {
    Router::new().route("/", guarded(state, &[Role::Admin], get(list_activity_logs)))
}

/// Registros de auditoría más recientes primero
async fn list_activity_logs(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityLog>>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let logs = state.repositories.activity_logs.find_recent(limit).await?;
    Ok(Json(ApiResponse::list(logs)))
}
