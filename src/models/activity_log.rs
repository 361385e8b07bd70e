//! Modelo de registro de actividad (auditoría)
//!
//! Cada intento denegado por el control de roles o de propiedad deja un
//! registro con el actor, la ruta, el resultado y los metadatos de la
//! petición.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Failure,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Success => "success",
            ActivityStatus::Failure => "failure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(ActivityStatus::Success),
            "failure" => Some(ActivityStatus::Failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserAgentInfo {
    pub browser: String,
    pub os: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    /// `None` cuando el actor no está autenticado
    pub user_id: Option<Uuid>,
    pub activity: Activity,
    pub details: String,
    pub status: ActivityStatus,
    pub ip_address: String,
    pub user_agent: UserAgentInfo,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn failure(
        user_id: Option<Uuid>,
        kind: impl Into<String>,
        action: impl Into<String>,
        details: impl Into<String>,
        ip_address: String,
        user_agent: UserAgentInfo,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            activity: Activity {
                kind: kind.into(),
                action: action.into(),
            },
            details: details.into(),
            status: ActivityStatus::Failure,
            ip_address,
            user_agent,
            created_at: Utc::now(),
        }
    }
}
