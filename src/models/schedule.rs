//! Modelo de Schedule
//!
//! Ruta con precio de un transportista, asociada a un plan, con sus
//! franjas horarias (hora, plazas, bus, llegada prevista).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: String,
    pub slots: u32,
    pub bus_number: String,
    pub expected_arrival_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub departure: String,
    pub destination: String,
    pub price: i64,
    pub transporter_id: Uuid,
    pub time_slots: Vec<TimeSlot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn find_slot(&self, time: &str) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|slot| slot.time == time)
    }
}

/// Filtros de búsqueda de schedules
#[derive(Debug, Clone, Default)]
pub struct ScheduleQuery {
    pub plan_id: Option<Uuid>,
    pub transporter_id: Option<Uuid>,
    pub destination: Option<String>,
}

impl ScheduleQuery {
    pub fn matches(&self, schedule: &Schedule) -> bool {
        self.plan_id.map_or(true, |id| schedule.plan_id == id)
            && self.transporter_id.map_or(true, |id| schedule.transporter_id == id)
            && self.destination.as_ref().map_or(true, |d| {
                schedule.destination.to_lowercase().contains(&d.to_lowercase())
            })
    }
}
