use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::schedule_controller::ScheduleController;
use crate::dto::{
    schedule_dto::{CreateScheduleRequest, ScheduleFilter, ScheduleResponse},
    ApiResponse, ValidatedJson,
};
use crate::middleware::{
    auth::{guarded, identified, Principal},
    request_meta::RequestMeta,
};
use crate::models::{schedule::Schedule, user::Role};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_schedule_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", guarded(state, &[Role::Transporter], post(create_schedule)))
        .route("/", identified(state, get(list_schedules)))
        .route("/:id", get(get_schedule))
        .route(
            "/:id",
            guarded(state, &[Role::Transporter, Role::Authority], delete(delete_schedule)),
        )
}

async fn create_schedule(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(request): ValidatedJson<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Schedule>>), AppError> {
    let controller = ScheduleController::new(&state);
    let schedule = controller.create(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(schedule))))
}

async fn list_schedules(
    State(state): State<AppState>,
    principal: Option<Principal>,
    Query(filter): Query<ScheduleFilter>,
) -> Result<Json<ApiResponse<Vec<Schedule>>>, AppError> {
    let controller = ScheduleController::new(&state);
    let schedules = controller.list(principal.as_ref(), filter).await?;
    Ok(Json(ApiResponse::list(schedules)))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScheduleResponse>>, AppError> {
    let controller = ScheduleController::new(&state);
    let schedule = controller.get(id).await?;
    Ok(Json(ApiResponse::success(schedule)))
}

async fn delete_schedule(
    State(state): State<AppState>,
    principal: Principal,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = ScheduleController::new(&state);
    controller.delete(&principal, id, &meta).await?;
    Ok(Json(ApiResponse::message("Schedule deleted")))
}
