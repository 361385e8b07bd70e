//! Rutas HTTP
//!
//! Un router por recurso, montados bajo `/api/v1`.

pub mod activity_log_routes;
pub mod auth_routes;
pub mod plan_routes;
pub mod schedule_routes;
pub mod travel_routes;
pub mod user_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::cors_middleware;
use crate::state::AppState;

/// Router completo de la aplicación con CORS y trazas
pub fn create_app_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes::create_auth_router())
        .nest("/plans", plan_routes::create_plan_router(&state))
        .nest("/schedules", schedule_routes::create_schedule_router(&state))
        .nest("/travels", travel_routes::create_travel_router(&state))
        .nest("/activity-logs", activity_log_routes::create_activity_log_router(&state))
        .merge(user_routes::create_user_router(&state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_middleware(&state.config.cors_origins)),
        )
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "school-transport",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
