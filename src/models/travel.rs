//! Modelo de Travel
//!
//! Un viaje reservado para un estudiante. Guarda una copia de los datos
//! del plan, del schedule y del transportista en el momento de la reserva,
//! y avanza por la máquina de estados de `TravelStatus`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::validation::utc_day_bounds;

/// Estado del viaje.
///
/// Progreso: `Pending` → `Boarded` → `Arrived At Destination` →
/// `Arrived At School`. `Cancelled` se alcanza desde cualquier estado no
/// terminal; `Left School` desde `Boarded` o `Arrived At Destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TravelStatus {
    Pending,
    Boarded,
    #[serde(rename = "Arrived At Destination")]
    ArrivedAtDestination,
    #[serde(rename = "Arrived At School")]
    ArrivedAtSchool,
    Cancelled,
    #[serde(rename = "Left School")]
    LeftSchool,
}

impl TravelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelStatus::Pending => "Pending",
            TravelStatus::Boarded => "Boarded",
            TravelStatus::ArrivedAtDestination => "Arrived At Destination",
            TravelStatus::ArrivedAtSchool => "Arrived At School",
            TravelStatus::Cancelled => "Cancelled",
            TravelStatus::LeftSchool => "Left School",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(TravelStatus::Pending),
            "Boarded" => Some(TravelStatus::Boarded),
            "Arrived At Destination" => Some(TravelStatus::ArrivedAtDestination),
            "Arrived At School" => Some(TravelStatus::ArrivedAtSchool),
            "Cancelled" => Some(TravelStatus::Cancelled),
            "Left School" => Some(TravelStatus::LeftSchool),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TravelStatus::ArrivedAtSchool | TravelStatus::Cancelled | TravelStatus::LeftSchool
        )
    }

    /// Posición en la línea de progreso; `None` para los finales alternativos
    fn progress(&self) -> Option<u8> {
        match self {
            TravelStatus::Pending => Some(0),
            TravelStatus::Boarded => Some(1),
            TravelStatus::ArrivedAtDestination => Some(2),
            TravelStatus::ArrivedAtSchool => Some(3),
            TravelStatus::Cancelled | TravelStatus::LeftSchool => None,
        }
    }

    /// Las transiciones sólo avanzan; nunca vuelven a un estado anterior.
    pub fn can_transition_to(&self, next: TravelStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            TravelStatus::Cancelled => true,
            TravelStatus::LeftSchool => matches!(
                self,
                TravelStatus::Boarded | TravelStatus::ArrivedAtDestination
            ),
            _ => match (self.progress(), next.progress()) {
                (Some(current), Some(target)) => target > current,
                _ => false,
            },
        }
    }

    /// Estados desde los que `next` es alcanzable
    pub fn sources_of(next: TravelStatus) -> Vec<TravelStatus> {
        ALL_STATUSES
            .iter()
            .copied()
            .filter(|status| status.can_transition_to(next))
            .collect()
    }
}

pub const ALL_STATUSES: [TravelStatus; 6] = [
    TravelStatus::Pending,
    TravelStatus::Boarded,
    TravelStatus::ArrivedAtDestination,
    TravelStatus::ArrivedAtSchool,
    TravelStatus::Cancelled,
    TravelStatus::LeftSchool,
];

impl std::fmt::Display for TravelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estado del cobro según el gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
}

impl PaymentStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "successful" | "success" => Some(PaymentStatus::Successful),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Datos de la transacción tal como los reporta el gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    #[serde(rename = "ref")]
    pub reference: String,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub status: PaymentStatus,
    pub data: PaymentData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub id: Uuid,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransporterSnapshot {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub bus_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDetails {
    pub plan: PlanSnapshot,
    pub departure: String,
    pub destination: String,
    pub price: i64,
    pub transporter: TransporterSnapshot,
    pub schedule: Uuid,
    pub departure_time: String,
    pub expected_arrival_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<PaymentDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Travel {
    pub id: Uuid,
    pub travel_details: TravelDetails,
    pub guardian: Guardian,
    pub student: Student,
    pub school: Uuid,
    pub status: TravelStatus,
    pub travel_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Travel {
    pub fn transporter_id(&self) -> Uuid {
        self.travel_details.transporter.id
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.travel_details
            .payment_details
            .as_ref()
            .map(|p| p.data.reference.as_str())
    }

    pub fn is_payment_confirmed(&self) -> bool {
        matches!(
            self.travel_details.payment_details,
            Some(PaymentDetails {
                status: PaymentStatus::Successful,
                ..
            })
        )
    }
}

/// Filtros de búsqueda de viajes. `transporter_id` y `school_id` son el
/// alcance impuesto por el servidor según el rol del solicitante.
#[derive(Debug, Clone, Default)]
pub struct TravelQuery {
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
    pub departure_time: Option<String>,
    pub schedule_id: Option<Uuid>,
    pub transporter_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
}

impl TravelQuery {
    pub fn matches(&self, travel: &Travel) -> bool {
        let details = &travel.travel_details;

        let destination_ok = self.destination.as_ref().map_or(true, |wanted| {
            details
                .destination
                .to_lowercase()
                .contains(&wanted.to_lowercase())
        });
        let date_ok = self.date.map_or(true, |date| {
            let (start, end) = utc_day_bounds(date);
            details.plan.date >= start && details.plan.date < end
        });

        destination_ok
            && date_ok
            && self
                .departure_time
                .as_ref()
                .map_or(true, |time| &details.departure_time == time)
            && self.schedule_id.map_or(true, |id| details.schedule == id)
            && self.transporter_id.map_or(true, |id| details.transporter.id == id)
            && self.school_id.map_or(true, |id| travel.school == id)
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use chrono::TimeZone;

    pub fn sample_travel() -> Travel {
        let now = Utc::now();
        Travel {
            id: Uuid::new_v4(),
            travel_details: TravelDetails {
                plan: PlanSnapshot {
                    id: Uuid::new_v4(),
                    date: Utc.with_ymd_and_hms(2025, 1, 15, 6, 0, 0).unwrap(),
                },
                departure: "Kigali".to_string(),
                destination: "Huye".to_string(),
                price: 5000,
                transporter: TransporterSnapshot {
                    id: Uuid::new_v4(),
                    name: "Volcano Express".to_string(),
                    contact: "+250780000000".to_string(),
                    bus_number: "RAD 123 A".to_string(),
                },
                schedule: Uuid::new_v4(),
                departure_time: "07:00 AM".to_string(),
                expected_arrival_time: now,
                payment_details: None,
            },
            guardian: Guardian {
                name: "Jane".to_string(),
                email: "jane@example.com".to_string(),
                phone_number: "+250780000001".to_string(),
                address: "Kicukiro".to_string(),
            },
            student: Student {
                name: "Eric".to_string(),
            },
            school: Uuid::new_v4(),
            status: TravelStatus::Pending,
            travel_number: "TR-123456-42".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::sample_travel;
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        use TravelStatus::*;
        assert!(Pending.can_transition_to(Boarded));
        assert!(Boarded.can_transition_to(ArrivedAtDestination));
        assert!(ArrivedAtDestination.can_transition_to(ArrivedAtSchool));
        assert!(Pending.can_transition_to(ArrivedAtDestination));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Boarded.can_transition_to(LeftSchool));
    }

    #[test]
    fn test_backward_and_terminal_transitions_rejected() {
        use TravelStatus::*;
        assert!(!Boarded.can_transition_to(Pending));
        assert!(!ArrivedAtDestination.can_transition_to(Boarded));
        assert!(!Boarded.can_transition_to(Boarded));
        assert!(!Pending.can_transition_to(LeftSchool));
        for terminal in [ArrivedAtSchool, Cancelled, LeftSchool] {
            for next in ALL_STATUSES {
                assert!(!terminal.can_transition_to(next), "{} -> {}", terminal, next);
            }
        }
    }

    #[test]
    fn test_sources_of_arrived_at_destination() {
        let sources = TravelStatus::sources_of(TravelStatus::ArrivedAtDestination);
        assert_eq!(sources, vec![TravelStatus::Pending, TravelStatus::Boarded]);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(TravelStatus::ArrivedAtDestination).unwrap(),
            "Arrived At Destination"
        );
        for status in ALL_STATUSES {
            assert_eq!(TravelStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_query_destination_is_case_insensitive_substring() {
        let travel = sample_travel();
        let query = TravelQuery {
            destination: Some("hUy".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&travel));

        let query = TravelQuery {
            destination: Some("Musanze".to_string()),
            ..Default::default()
        };
        assert!(!query.matches(&travel));
    }

    #[test]
    fn test_query_date_is_utc_day_bounded() {
        let travel = sample_travel();
        let same_day = TravelQuery {
            date: NaiveDate::from_ymd_opt(2025, 1, 15),
            ..Default::default()
        };
        let next_day = TravelQuery {
            date: NaiveDate::from_ymd_opt(2025, 1, 16),
            ..Default::default()
        };
        assert!(same_day.matches(&travel));
        assert!(!next_day.matches(&travel));
    }

    #[test]
    fn test_query_scope_fields() {
        let travel = sample_travel();
        let own = TravelQuery {
            transporter_id: Some(travel.transporter_id()),
            ..Default::default()
        };
        let other = TravelQuery {
            transporter_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(own.matches(&travel));
        assert!(!other.matches(&travel));
    }
}
