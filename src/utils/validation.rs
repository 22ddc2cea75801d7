//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos de los requests de asignaciones.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use validator::ValidationError;

use crate::models::AllocationStatus;

/// Normalizar una fecha a su representación sólo-fecha
///
/// Acepta `YYYY-MM-DD`, un timestamp RFC3339 o `YYYY-MM-DDTHH:MM:SS`;
/// la parte horaria se descarta. Cualquier otro texto, incluido uno con
/// espacios alrededor, se rechaza.
pub fn normalize_date(value: &str) -> Result<NaiveDate, ValidationError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }
    if let Ok(datetime) = value.parse::<NaiveDateTime>() {
        return Ok(datetime.date());
    }

    let mut error = ValidationError::new("date");
    error.add_param("value".into(), &value.to_string());
    error.add_param("format".into(), &"YYYY-MM-DD".to_string());
    Err(error)
}

/// Validar un identificador: no vacío y sin espacios al principio o al final
pub fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    if value.trim() != value {
        let mut error = ValidationError::new("surrounding_whitespace");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar y convertir el estado de una asignación
pub fn validate_status(value: &str) -> Result<AllocationStatus, ValidationError> {
    value.parse().map_err(|_| {
        let mut error = ValidationError::new("enum");
        error.add_param("value".into(), &value.to_string());
        error.add_param("allowed_values".into(), &AllocationStatus::ALLOWED);
        error
    })
}

/// Tratar un parámetro de query vacío como ausente
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 10, 30).unwrap();
        assert_eq!(normalize_date("2024-10-30").unwrap(), expected);
        assert_eq!(normalize_date("2024-10-30T18:45:00Z").unwrap(), expected);
        assert_eq!(normalize_date("2024-10-30T00:00:00").unwrap(), expected);

        assert!(normalize_date("2024/10/30").is_err());
        assert!(normalize_date("2024-02-30").is_err());
        assert!(normalize_date("").is_err());
        assert!(normalize_date(" 2024-10-30 ").is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("veh1").is_ok());
        assert!(validate_identifier("veh 1").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("   ").is_err());
        assert!(validate_identifier(" emp1 ").is_err());
        assert!(validate_identifier("veh1  ").is_err());
    }

    #[test]
    fn test_validate_status() {
        assert_eq!(validate_status("active").unwrap(), AllocationStatus::Active);
        assert_eq!(validate_status("canceled").unwrap(), AllocationStatus::Canceled);
        assert!(validate_status("archived").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("emp1".into())), Some("emp1".to_string()));
        assert_eq!(non_blank(Some("".into())), None);
        assert_eq!(non_blank(Some(" emp1".into())), Some(" emp1".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
