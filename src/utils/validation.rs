//! Utilidades de validación
//!
//! Validadores personalizados usados por los DTOs (`#[validate(custom = ...)]`)
//! y por los controladores.

use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref TRAVEL_NUMBER_RE: Regex = Regex::new(r"^TR-\d{6}-\d{1,4}$").unwrap();
    static ref RESET_CODE_RE: Regex = Regex::new(r"^\d{6}$").unwrap();
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'));
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if !allowed || clean_phone.len() < 10 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        error.message = Some("must be a phone number with 10 to 15 digits".into());
        return Err(error);
    }
    Ok(())
}

/// Validar que ninguna entrada de la lista esté vacía
pub fn validate_non_empty_entries(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        let mut error = ValidationError::new("not_empty");
        error.message = Some("entries must not be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Validar el código de reseteo de contraseña (6 dígitos)
pub fn validate_reset_code(value: &str) -> Result<(), ValidationError> {
    if !RESET_CODE_RE.is_match(value) {
        let mut error = ValidationError::new("reset_code");
        error.message = Some("must be a 6-digit code".into());
        return Err(error);
    }
    Ok(())
}

/// Verificar formato `TR-<6 dígitos>-<1 a 4 dígitos>`
pub fn is_travel_number(value: &str) -> bool {
    TRAVEL_NUMBER_RE.is_match(value)
}

/// Validar y convertir string a fecha (YYYY-MM-DD)
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Límites UTC `[inicio, fin)` del día dado
pub fn utc_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    (start, start + chrono::Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+250780000000").is_ok());
        assert!(validate_phone("0780000001").is_ok());
        assert!(validate_phone("078 000 0001").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("07800000ab").is_err());
    }

    #[test]
    fn test_travel_number_format() {
        assert!(is_travel_number("TR-123456-7"));
        assert!(is_travel_number("TR-000001-9999"));
        assert!(!is_travel_number("TR-12345-7"));
        assert!(!is_travel_number("TR-123456-12345"));
        assert!(!is_travel_number("XX-123456-1"));
    }

    #[test]
    fn test_reset_code() {
        assert!(validate_reset_code("012345").is_ok());
        assert!(validate_reset_code("12345").is_err());
        assert!(validate_reset_code("abcdef").is_err());
    }

    #[test]
    fn test_utc_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let (start, end) = utc_day_bounds(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 16, 0, 0, 0).unwrap());
        assert!(validate_date("2025-01-15").is_ok());
        assert!(validate_date("15/01/2025").is_err());
    }
}
