use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{models::user::User, utils::validation::validate_reset_code};

// Sign-in request
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: User,
}

// Sign-in response: `{ status, token, data: { user } }`
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub status: &'static str,
    pub token: String,
    pub data: UserEnvelope,
}

impl SignInResponse {
    pub fn success(token: String, user: User) -> Self {
        Self {
            status: "success",
            token,
            data: UserEnvelope { user },
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(custom = "validate_reset_code")]
    pub code: String,
    #[serde(default)]
    #[validate(length(min = 6))]
    pub password: String,
}
