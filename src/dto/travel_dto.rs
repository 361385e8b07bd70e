use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        travel::{Guardian, Student, Travel, TravelDetails, TravelStatus},
        user::{Account, User},
    },
    utils::validation::validate_phone,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuardianRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub address: String,
}

impl From<GuardianRequest> for Guardian {
    fn from(request: GuardianRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            phone_number: request.phone_number.trim().to_string(),
            address: request.address.trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct StudentRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
}

// Request para reservar un viaje
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTravelRequest {
    #[serde(default)]
    #[validate]
    pub guardian: GuardianRequest,
    #[serde(default)]
    #[validate]
    pub student: StudentRequest,
    #[validate(required)]
    pub school: Option<Uuid>,
    #[validate(required)]
    pub schedule: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub departure_time: String,
    /// Teléfono que paga; por defecto el del tutor
    #[validate(custom = "validate_phone")]
    pub payer_phone_number: Option<String>,
}

// Request administrativo de actualización
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTravelRequest {
    pub status: Option<TravelStatus>,
    #[validate]
    pub guardian: Option<GuardianRequest>,
    #[validate]
    pub student: Option<StudentRequest>,
}

// Filtros de listado (`?destination=&date=&timeSlot=&scheduleId=`)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelFilter {
    pub destination: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub schedule_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalQuery {
    pub time_slot: Option<String>,
}

/// Escuela resumida dentro de un viaje
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl From<&User> for SchoolSummary {
    fn from(user: &User) -> Self {
        let (district, sector) = match &user.account {
            Account::School {
                district, sector, ..
            } => (Some(district.clone()), Some(sector.clone())),
            _ => (None, None),
        };
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            district,
            sector,
        }
    }
}

/// Escuela poblada o, si ya no existe, sólo su id
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SchoolRef {
    Populated(SchoolSummary),
    Id(Uuid),
}

// Response de viaje con la escuela poblada
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelResponse {
    pub id: Uuid,
    pub travel_details: TravelDetails,
    pub guardian: Guardian,
    pub student: Student,
    pub school: SchoolRef,
    pub status: TravelStatus,
    pub travel_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TravelResponse {
    pub fn new(travel: Travel, school: Option<&User>) -> Self {
        let school = match school {
            Some(user) => SchoolRef::Populated(SchoolSummary::from(user)),
            None => SchoolRef::Id(travel.school),
        };
        Self {
            id: travel.id,
            travel_details: travel.travel_details,
            guardian: travel.guardian,
            student: travel.student,
            school,
            status: travel.status,
            travel_number: travel.travel_number,
            created_at: travel.created_at,
            updated_at: travel.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkArrivalResponse {
    pub schedule_id: Uuid,
    pub time_slot: String,
    pub updated: usize,
    pub travels: Vec<TravelResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_lists_every_problem() {
        let request: CreateTravelRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        let errors = request.validate().unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();

        for field in ["guardian", "student", "school", "schedule", "departure_time"] {
            assert!(json.get(field).is_some(), "missing error for {}", field);
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let request: CreateTravelRequest = serde_json::from_value(serde_json::json!({
            "guardian": {
                "name": "Jane",
                "email": "jane@example.com",
                "phoneNumber": "+250780000001",
                "address": "Kicukiro"
            },
            "student": { "name": "Eric" },
            "school": Uuid::new_v4(),
            "schedule": Uuid::new_v4(),
            "departureTime": "07:00 AM"
        }))
        .unwrap();
        assert!(request.validate().is_ok());
    }
}
