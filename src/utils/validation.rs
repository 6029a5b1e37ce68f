//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! de entrada (patentes, chasis, montos).

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

use crate::utils::errors::{invalid_input_error, AppResult};

/// Largo exacto de un número de chasis (VIN)
pub const CHASSIS_LENGTH: usize = 17;

fn plate_regex() -> &'static Regex {
    static PLATE: OnceLock<Regex> = OnceLock::new();
    // Formato viejo (ABC123) y Mercosur (AB123CD)
    PLATE.get_or_init(|| {
        Regex::new(r"^(?:[A-Z]{3}[0-9]{3}|[A-Z]{2}[0-9]{3}[A-Z]{2})$").expect("patente regex válida")
    })
}

/// Normalizar y validar una patente. Devuelve la patente en mayúsculas
/// sin espacios ni guiones.
pub fn normalize_license_plate(value: &str) -> AppResult<String> {
    let clean: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .collect::<String>()
        .to_uppercase();

    if clean.is_empty() {
        return Err(invalid_input_error("La patente es obligatoria"));
    }

    if !plate_regex().is_match(&clean) {
        return Err(invalid_input_error(format!(
            "Formato de patente inválido: '{}' (use ABC123 o AB123CD)",
            value.trim()
        )));
    }

    Ok(clean)
}

/// Normalizar y validar un número de chasis (exactamente 17 caracteres)
pub fn normalize_chassis(value: &str) -> AppResult<String> {
    let clean = value.trim().to_uppercase();
    if clean.chars().count() != CHASSIS_LENGTH {
        return Err(invalid_input_error(
            "El chasis debe tener exactamente 17 caracteres",
        ));
    }
    Ok(clean)
}

/// Validar que un string no esté vacío
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un monto sea no negativo
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Igual que `validate_non_negative` pero con el error de la aplicación
pub fn ensure_non_negative(field: &str, value: Decimal) -> AppResult<Decimal> {
    validate_non_negative(&value)
        .map_err(|_| invalid_input_error(format!("{} no puede ser negativo", field)))?;
    Ok(value)
}

/// Formato de dos decimales para montos
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_normalize_license_plate() {
        assert_eq!(normalize_license_plate(" abc-123 ").unwrap(), "ABC123");
        assert_eq!(normalize_license_plate("ab 123 cd").unwrap(), "AB123CD");
        assert!(normalize_license_plate("").is_err());
        assert!(normalize_license_plate("A1").is_err());
        assert!(normalize_license_plate("ABCD1234").is_err());
    }

    #[test]
    fn test_normalize_chassis() {
        assert_eq!(
            normalize_chassis("1hgcm82633a004352").unwrap(),
            "1HGCM82633A004352"
        );
        assert!(normalize_chassis("SHORT").is_err());
        assert!(normalize_chassis("1HGCM82633A0043521").is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative(&Decimal::from_str("150.00").unwrap()).is_ok());
        assert!(validate_non_negative(&Decimal::from_str("-0.01").unwrap()).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from_str("150").unwrap()), "150.00");
        assert_eq!(format_amount(Decimal::from_str("99.999").unwrap()), "100.00");
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("motor").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
