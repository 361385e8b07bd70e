//! DTOs de la API
//!
//! Requests validados con `validator` y responses serializadas en
//! camelCase.

pub mod api_response;
pub mod auth_dto;
pub mod plan_dto;
pub mod schedule_dto;
pub mod travel_dto;
pub mod user_dto;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::utils::errors::AppError;

pub use api_response::ApiResponse;

/// Body JSON deserializado y validado; cualquier fallo es un 400 propio
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
