use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::plan_controller::PlanController;
use crate::dto::{plan_dto::CreatePlanRequest, ApiResponse, ValidatedJson};
use crate::middleware::auth::{guarded, Principal};
use crate::models::{plan::Plan, schedule::Schedule, user::Role};
use crate::state::AppState;
use crate::utils::errors::AppError;

const AUTHORITY: &[Role] = &[Role::Authority];

pub fn create_plan_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", guarded(state, AUTHORITY, post(create_plan)))
        .route("/", get(list_plans))
        .route("/:id", get(get_plan))
        .route("/:id", guarded(state, AUTHORITY, delete(delete_plan)))
        .route("/:id/schedules", get(list_plan_schedules))
}

async fn create_plan(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(request): ValidatedJson<CreatePlanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Plan>>), AppError> {
    let controller = PlanController::new(&state);
    let plan = controller.create(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(plan))))
}

async fn list_plans(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Plan>>>, AppError> {
    let controller = PlanController::new(&state);
    let plans = controller.list().await?;
    Ok(Json(ApiResponse::list(plans)))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Plan>>, AppError> {
    let controller = PlanController::new(&state);
    let plan = controller.get(id).await?;
    Ok(Json(ApiResponse::success(plan)))
}

async fn list_plan_schedules(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Schedule>>>, AppError> {
    let controller = PlanController::new(&state);
    let schedules = controller.schedules(id).await?;
    Ok(Json(ApiResponse::list(schedules)))
}

async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = PlanController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Plan deleted")))
}
