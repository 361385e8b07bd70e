use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    plan::Plan,
    schedule::{Schedule, TimeSlot},
    user::User,
};

// Request para crear un schedule
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    #[validate(required)]
    pub plan: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub departure: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub destination: String,
    #[validate(required, range(min = 0))]
    pub price: Option<i64>,
    #[serde(default)]
    #[validate(custom = "validate_time_slots")]
    pub time_slots: Vec<TimeSlot>,
}

fn validate_time_slots(slots: &[TimeSlot]) -> Result<(), ValidationError> {
    let message = if slots.is_empty() {
        Some("at least one time slot is required")
    } else if slots.iter().any(|s| s.time.trim().is_empty() || s.bus_number.trim().is_empty()) {
        Some("every time slot needs a time and a bus number")
    } else if slots.iter().any(|s| s.slots == 0) {
        Some("every time slot needs at least one seat")
    } else {
        let mut times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        times.sort_unstable();
        times.dedup();
        (times.len() != slots.len()).then_some("time slot labels must be unique")
    };

    match message {
        Some(message) => {
            let mut error = ValidationError::new("time_slots");
            error.message = Some(message.into());
            Err(error)
        }
        None => Ok(()),
    }
}

// Filtros de listado (`?plan=&transporter=&destination=`)
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleFilter {
    pub plan: Option<Uuid>,
    pub transporter: Option<Uuid>,
    pub destination: Option<String>,
}

/// Transportista resumido dentro de un schedule
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransporterSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

impl From<&User> for TransporterSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

// Response de schedule con plan y transportista poblados
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub plan: Option<Plan>,
    pub transporter: Option<TransporterSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn slot(time: &str, seats: u32) -> TimeSlot {
        TimeSlot {
            time: time.to_string(),
            slots: seats,
            bus_number: "RAD 123 A".to_string(),
            expected_arrival_time: Utc::now(),
        }
    }

    #[test]
    fn test_time_slot_rules() {
        assert!(validate_time_slots(&[slot("07:00 AM", 30)]).is_ok());
        assert!(validate_time_slots(&[]).is_err());
        assert!(validate_time_slots(&[slot("07:00 AM", 0)]).is_err());
        assert!(validate_time_slots(&[slot("07:00 AM", 30), slot("07:00 AM", 10)]).is_err());
    }
}
