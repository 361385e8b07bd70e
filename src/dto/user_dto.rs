use serde::Deserialize;
use validator::Validate;

use crate::{
    models::user::Role,
    utils::validation::{validate_non_empty_entries, validate_phone},
};

/// Campos comunes a todas las cuentas
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountBaseRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    /// Si falta se usa `DEFAULT_PASSWORD`
    #[validate(length(min = 6))]
    pub password: Option<String>,
}

// Request para crear user / admin / authority
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(flatten)]
    #[validate]
    pub base: AccountBaseRequest,
    pub role: Option<Role>,
}

// Request para crear un transportista
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransporterRequest {
    #[serde(flatten)]
    #[validate]
    pub base: AccountBaseRequest,
    #[serde(default)]
    #[validate(length(min = 1), custom = "validate_non_empty_entries")]
    pub area_of_operations: Vec<String>,
}

// Request para crear una escuela
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSchoolRequest {
    #[serde(flatten)]
    #[validate]
    pub base: AccountBaseRequest,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub district: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub sector: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub cell: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub village: String,
}
