use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    models::plan::Province,
    utils::validation::{utc_day_bounds, validate_non_empty_entries},
};

// Request para crear un plan
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[serde(default)]
    #[validate(custom = "validate_plan_date")]
    pub date: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "at least one destination is required"),
        custom = "validate_non_empty_entries"
    )]
    pub destinations: Vec<String>,
    pub province: Option<Province>,
}

/// Acepta RFC 3339 o `YYYY-MM-DD` (medianoche UTC)
pub fn parse_plan_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| utc_day_bounds(date).0)
        })
}

fn validate_plan_date(value: &str) -> Result<(), ValidationError> {
    if parse_plan_date(value).is_none() {
        let mut error = ValidationError::new("date");
        error.message = Some("must be a valid date (YYYY-MM-DD or RFC 3339)".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_date_formats() {
        assert!(parse_plan_date("2025-01-15").is_some());
        assert!(parse_plan_date("2025-01-15T06:00:00Z").is_some());
        assert!(parse_plan_date("next monday").is_none());
    }

    #[test]
    fn test_missing_fields_are_reported_together() {
        let request: CreatePlanRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("date"));
        assert!(fields.contains_key("destinations"));
    }
}
