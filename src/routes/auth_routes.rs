use axum::{extract::State, routing::post, Json, Router};

use crate::controllers::auth_controller::{AuthController, RESET_CODE_VALID_MINUTES};
use crate::dto::{
    auth_dto::{ForgotPasswordRequest, ResetPasswordRequest, SignInRequest, SignInResponse},
    ApiResponse, ValidatedJson,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Configura las rutas de autenticación
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/signin", post(signin))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

async fn signin(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let controller = AuthController::new(&state);
    let response = controller.signin(request).await?;
    Ok(Json(response))
}

async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AuthController::new(&state);
    controller.forgot_password(request).await?;
    Ok(Json(ApiResponse::message(format!(
        "A reset code valid for {} minutes was sent to your email",
        RESET_CODE_VALID_MINUTES
    ))))
}

async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AuthController::new(&state);
    controller.reset_password(request).await?;
    Ok(Json(ApiResponse::message("Password updated, you can now sign in")))
}
