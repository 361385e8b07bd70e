//! Modelo de Plan
//!
//! Plan de viaje publicado por una autoridad: fecha + destinos candidatos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provincia a la que aplica el plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Province {
    South,
    North,
    East,
    West,
    #[serde(rename = "kigali city")]
    KigaliCity,
}

impl Province {
    pub fn as_str(&self) -> &'static str {
        match self {
            Province::South => "south",
            Province::North => "north",
            Province::East => "east",
            Province::West => "west",
            Province::KigaliCity => "kigali city",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "south" => Some(Province::South),
            "north" => Some(Province::North),
            "east" => Some(Province::East),
            "west" => Some(Province::West),
            "kigali city" => Some(Province::KigaliCity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub destinations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<Province>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// El destino pertenece al plan (sin distinguir mayúsculas)
    pub fn offers_destination(&self, destination: &str) -> bool {
        let wanted = destination.trim().to_lowercase();
        self.destinations
            .iter()
            .any(|d| d.trim().to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offers_destination_ignores_case() {
        let plan = Plan {
            id: Uuid::new_v4(),
            date: Utc::now(),
            destinations: vec!["Huye".to_string(), "Musanze".to_string()],
            province: Some(Province::South),
            created_by: None,
            created_at: Utc::now(),
        };
        assert!(plan.offers_destination("huye"));
        assert!(plan.offers_destination(" Musanze "));
        assert!(!plan.offers_destination("Rubavu"));
    }

    #[test]
    fn test_province_wire_names() {
        assert_eq!(serde_json::to_value(Province::KigaliCity).unwrap(), "kigali city");
        assert_eq!(Province::from_str("kigali city"), Some(Province::KigaliCity));
    }
}
