//! Request checks shared by the JSON handlers.

use rust_decimal::Decimal;

use kanak_core::{MetalType, Purity};

use crate::error::AppError;

/// Largest weight a `NUMERIC(10, 3)` column holds.
pub const MAX_WEIGHT_GRAMS: Decimal = Decimal::from_parts(0x540B_E3FF, 0x2, 0, false, 3); // 9_999_999.999

/// Largest amount a `NUMERIC(12, 2)` column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2); // 9_999_999_999.99

/// Reject a purity grade that belongs to another metal.
///
/// # Errors
///
/// Returns `AppError::BadRequest` on mismatch.
pub fn purity_matches(metal: MetalType, purity: Purity) -> Result<(), AppError> {
    if purity.is_valid_for(metal) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "purity {purity} is not valid for {metal}"
        )))
    }
}

/// # Errors
///
/// Returns `AppError::BadRequest` if `value` is negative.
fn non_negative(field: &str, value: Decimal) -> Result<(), AppError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::BadRequest(format!("{field} must not be negative")));
    }
    Ok(())
}

/// # Errors
///
/// Returns `AppError::BadRequest` unless `value` is above zero.
fn positive(field: &str, value: Decimal) -> Result<(), AppError> {
    if value <= Decimal::ZERO {
        return Err(AppError::BadRequest(format!("{field} must be greater than zero")));
    }
    Ok(())
}

fn at_most(field: &str, value: Decimal, max: Decimal) -> Result<(), AppError> {
    if value > max {
        return Err(AppError::BadRequest(format!("{field} must be at most {max}")));
    }
    Ok(())
}

/// A weight in grams: above zero and storable.
///
/// # Errors
///
/// Returns `AppError::BadRequest` outside `(0, MAX_WEIGHT_GRAMS]`.
pub fn weight(field: &str, value: Decimal) -> Result<(), AppError> {
    positive(field, value)?;
    at_most(field, value.round_dp(3), MAX_WEIGHT_GRAMS)
}

/// A rupee amount that may be zero.
///
/// # Errors
///
/// Returns `AppError::BadRequest` outside `[0, MAX_MONEY]`.
pub fn money(field: &str, value: Decimal) -> Result<(), AppError> {
    non_negative(field, value)?;
    at_most(field, value.round_dp(2), MAX_MONEY)
}

/// A rupee amount that must be above zero.
///
/// # Errors
///
/// Returns `AppError::BadRequest` outside `(0, MAX_MONEY]`.
pub fn positive_money(field: &str, value: Decimal) -> Result<(), AppError> {
    positive(field, value)?;
    at_most(field, value.round_dp(2), MAX_MONEY)
}

/// Trimmed text that must not be blank.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for blank input.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value)
}

/// Blank optional text is treated as absent.
#[must_use]
pub fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purity_must_match_metal() {
        assert!(purity_matches(MetalType::Gold, Purity::K22).is_ok());
        assert!(purity_matches(MetalType::Silver, Purity::K22).is_err());
        assert!(purity_matches(MetalType::Platinum, Purity::Pt950).is_ok());
    }

    #[test]
    fn test_amount_checks() {
        assert!(non_negative("price", Decimal::ZERO).is_ok());
        assert!(non_negative("price", Decimal::new(-1, 2)).is_err());
        assert!(positive("weight_grams", Decimal::ZERO).is_err());
        assert!(positive("weight_grams", Decimal::new(1, 3)).is_ok());
    }

    #[test]
    fn test_column_limits() {
        assert_eq!(MAX_WEIGHT_GRAMS.to_string(), "9999999.999");
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");

        assert!(weight("weight_grams", MAX_WEIGHT_GRAMS).is_ok());
        assert!(weight("weight_grams", Decimal::new(10_000_000, 0)).is_err());
        assert!(weight("weight_grams", Decimal::new(99_999_999_999_995, 7)).is_err());
        assert!(money("price", MAX_MONEY).is_ok());
        assert!(money("price", Decimal::ZERO).is_ok());
        assert!(money("price", Decimal::new(10_000_000_000, 0)).is_err());
        assert!(positive_money("amount", Decimal::ZERO).is_err());
    }

    #[test]
    fn test_extreme_values_rejected() {
        let huge = Decimal::from_str_exact("79228162514264337593543950").unwrap_or(Decimal::MAX);
        assert!(weight("weight_grams", huge).is_err());
        assert!(weight("weight_grams", Decimal::MAX).is_err());
        assert!(positive_money("amount", Decimal::MAX).is_err());
    }

    #[test]
    fn test_text_checks() {
        assert_eq!(required("name", "  Asha ").ok(), Some("Asha"));
        assert!(required("name", "   ").is_err());
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" note ")), Some("note"));
    }
}
