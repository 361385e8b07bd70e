//! Controlador de autenticación
//!
//! Sign-in con bcrypt + JWT y reseteo de contraseña con código de 6
//! dígitos válido 10 minutos.

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::info;

use crate::{
    dto::auth_dto::{ForgotPasswordRequest, ResetPasswordRequest, SignInRequest, SignInResponse},
    state::AppState,
    utils::{
        errors::{AppError, AppResult},
        jwt::generate_token,
        password::{hash_password, verify_password},
    },
};

pub const RESET_CODE_VALID_MINUTES: i64 = 10;

pub struct AuthController {
    state: AppState,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn signin(&self, request: SignInRequest) -> AppResult<SignInResponse> {
        let invalid = || AppError::Unauthorized("Incorrect email or password".to_string());

        let user = self
            .state
            .repositories
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(request.password, user.password_hash.clone()).await? {
            return Err(invalid());
        }

        let token = generate_token(user.id, user.role(), &self.state.jwt_config())?;
        info!("🔑 {} signed in as {}", user.email, user.role());
        Ok(SignInResponse::success(token, user))
    }

    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> AppResult<()> {
        let users = &self.state.repositories.users;
        let mut user = users.find_by_email(&request.email).await?.ok_or_else(|| {
            AppError::NotFound("There is no user with that email address".to_string())
        })?;

        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        user.password_reset_code = Some(code.clone());
        user.password_reset_expires = Some(Utc::now() + Duration::minutes(RESET_CODE_VALID_MINUTES));
        users.save(&user).await?;

        info!("🔁 Password reset requested for {}", user.email);
        self.state
            .notifier
            .password_reset(&user, &code, RESET_CODE_VALID_MINUTES)
            .await;
        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<()> {
        let users = &self.state.repositories.users;
        let mut user = users.find_by_email(&request.email).await?.ok_or_else(|| {
            AppError::NotFound("There is no user with that email address".to_string())
        })?;

        let code_matches = user.password_reset_code.as_deref() == Some(request.code.as_str());
        let still_valid = user
            .password_reset_expires
            .map_or(false, |expires| expires > Utc::now());
        if !code_matches || !still_valid {
            return Err(AppError::BadRequest(
                "Reset code is invalid or has expired".to_string(),
            ));
        }

        user.password_hash = hash_password(request.password, self.state.config.bcrypt_cost).await?;
        user.password_reset_code = None;
        user.password_reset_expires = None;
        users.save(&user).await?;

        info!("✅ Password reset for {}", user.email);
        Ok(())
    }
}
