//! Modelo de cuentas
//!
//! Una cuenta tiene una base común (nombre, email, teléfono, hash) y una
//! variante por rol con sus atributos propios. El comportamiento específico
//! de cada rol se resuelve con `match` sobre la variante.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Authority,
    Transporter,
    School,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Authority => "authority",
            Role::Transporter => "transporter",
            Role::School => "school",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "authority" => Some(Role::Authority),
            "transporter" => Some(Role::Transporter),
            "school" => Some(Role::School),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variante de la cuenta, discriminada por `role`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Account {
    User,
    Admin,
    Authority,
    #[serde(rename_all = "camelCase")]
    Transporter { area_of_operations: Vec<String> },
    School {
        district: String,
        sector: String,
        cell: String,
        village: String,
    },
}

impl Account {
    pub fn role(&self) -> Role {
        match self {
            Account::User => Role::User,
            Account::Admin => Role::Admin,
            Account::Authority => Role::Authority,
            Account::Transporter { .. } => Role::Transporter,
            Account::School { .. } => Role::School,
        }
    }
}

/// Cuenta persistida
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(flatten)]
    pub account: Account,
    #[serde(skip_serializing)]
    pub password_reset_code: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        email: String,
        phone_number: String,
        password_hash: String,
        account: Account,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: email.trim().to_lowercase(),
            phone_number,
            password_hash,
            account,
            password_reset_code: None,
            password_reset_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn role(&self) -> Role {
        self.account.role()
    }
}
