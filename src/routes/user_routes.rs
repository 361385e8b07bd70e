use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::controllers::user_controller::UserController;
use crate::dto::{
    user_dto::{CreateSchoolRequest, CreateTransporterRequest, CreateUserRequest},
    ApiResponse, ValidatedJson,
};
use crate::middleware::auth::guarded;
use crate::models::user::{Role, User};
use crate::state::AppState;
use crate::utils::errors::AppError;

const ADMIN: &[Role] = &[Role::Admin];

#[derive(Debug, Deserialize)]
struct RoleQuery {
    role: Option<Role>,
}

/// Montado en la raíz de `/api/v1`: `/users`, `/transporters`, `/schools`
pub fn create_user_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users", guarded(state, ADMIN, post(create_user)))
        .route("/users", guarded(state, ADMIN, get(list_users)))
        .route("/users/:id", guarded(state, ADMIN, get(get_user)))
        .route("/users/:id", guarded(state, ADMIN, delete(delete_user)))
        .route("/transporters", guarded(state, ADMIN, post(create_transporter)))
        .route("/transporters", get(list_transporters))
        .route("/schools", guarded(state, ADMIN, post(create_school)))
        .route("/schools", get(list_schools))
}

async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let controller = UserController::new(&state);
    let user = controller.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let controller = UserController::new(&state);
    let users = controller.list(query.role).await?;
    Ok(Json(ApiResponse::list(users)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let controller = UserController::new(&state);
    let user = controller.get(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = UserController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("User deleted")))
}

async fn create_transporter(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateTransporterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let controller = UserController::new(&state);
    let user = controller.create_transporter(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

async fn list_transporters(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let controller = UserController::new(&state);
    let users = controller.list(Some(Role::Transporter)).await?;
    Ok(Json(ApiResponse::list(users)))
}

async fn create_school(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateSchoolRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let controller = UserController::new(&state);
    let user = controller.create_school(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

async fn list_schools(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let controller = UserController::new(&state);
    let users = controller.list(Some(Role::School)).await?;
    Ok(Json(ApiResponse::list(users)))
}
