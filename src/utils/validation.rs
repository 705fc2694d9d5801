//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos. Las
//! funciones `validate_*` devuelven `ValidationError` para poder usarse con
//! `#[validate(custom = "...")]`.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Matrícula: letras, cifras, guiones y espacios (`AB-123-CD`, `1234 AB 56`)
    static ref LICENSE_PLATE: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9\- ]{1,18}[A-Z0-9]$")
        .expect("license plate regex");
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_empty"));
    }
    Ok(())
}

/// Normaliza una matrícula: mayúsculas y sin espacios sobrantes
pub fn normalize_license_plate(value: &str) -> String {
    value.trim().to_uppercase()
}

pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if !LICENSE_PLATE.is_match(&normalize_license_plate(value)) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

pub fn validate_latitude(value: f64) -> Result<(), ValidationError> {
    validate_range(value, -90.0, 90.0, "latitude")
}

pub fn validate_longitude(value: f64) -> Result<(), ValidationError> {
    validate_range(value, -180.0, 180.0, "longitude")
}

fn validate_range(value: f64, min: f64, max: f64, code: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        let mut error = ValidationError::new(code);
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor esté en el conjunto permitido
pub fn validate_one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if !allowed.contains(&value) {
        let mut error = ValidationError::new(code);
        error.add_param("value".into(), &value.to_string());
        error.add_param("allowed".into(), &allowed.join(", "));
        return Err(error);
    }
    Ok(())
}

pub fn validate_vehicle_status(value: &str) -> Result<(), ValidationError> {
    validate_one_of(value, &["available", "assigned", "maintenance"], "vehicle_status")
}

pub fn validate_request_status(value: &str) -> Result<(), ValidationError> {
    validate_one_of(value, &["pending", "approved", "rejected", "completed"], "request_status")
}
