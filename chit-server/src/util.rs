//! Password hashing and input validation helpers

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};

/// Minimum password length for signup and reset
pub const MIN_PASSWORD_LEN: usize = 8;
/// Max length for names and titles
pub const MAX_NAME_LEN: usize = 100;
/// Max length for phone numbers
pub const MAX_PHONE_LEN: usize = 15;
/// Fraction digits of a `NUMERIC(12,2)` money column
pub const MONEY_SCALE: u32 = 2;
/// Integer digits of a `NUMERIC(12,2)` money column
const MONEY_INTEGER_DIGITS: u32 = 10;

pub const AT_LEAST_ONE: &str = "Ensure this value is greater than or equal to 1.";

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Non-empty after trimming, at most `max_len` characters
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::field(field, "This field may not be blank."));
    }
    if value.chars().count() > max_len {
        return Err(AppError::field(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        ));
    }
    Ok(())
}

pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max_len => Err(AppError::field(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        )),
        _ => Ok(()),
    }
}

pub fn validate_password(password: &str, field: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort).with_detail(
            field,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters."),
        ));
    }
    Ok(())
}

pub fn validate_slot_count(slot_count: i32) -> Result<(), AppError> {
    if slot_count < 1 {
        return Err(AppError::field("slot_count", AT_LEAST_ONE));
    }
    Ok(())
}

/// Money must fit `NUMERIC(12,2)` exactly: at most 2 fraction digits and
/// 10 integer digits. Sign rules are left to the caller.
pub fn validate_amount(value: Decimal, field: &str) -> Result<(), AppError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(AppError::new(ErrorCode::InvalidAmount)
            .with_detail(field, "Ensure that there are no more than 2 decimal places."));
    }
    if value.abs() >= Decimal::from(10_i64.pow(MONEY_INTEGER_DIGITS)) {
        return Err(AppError::new(ErrorCode::InvalidAmount).with_detail(
            field,
            "Ensure that there are no more than 10 digits before the decimal point.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn text_validation() {
        assert!(validate_required_text("Pool", "title", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("   ", "title", MAX_NAME_LEN).unwrap_err();
        assert!(err.details.unwrap().contains_key("title"));
        assert!(validate_required_text(&"x".repeat(101), "title", MAX_NAME_LEN).is_err());
        assert!(validate_optional_text(None, "name", 3).is_ok());
        assert!(validate_optional_text(Some("abcd"), "name", 3).is_err());
    }

    #[test]
    fn password_and_slot_validation() {
        assert_eq!(
            validate_password("short", "password").unwrap_err().code,
            ErrorCode::PasswordTooShort
        );
        assert!(validate_password("long enough", "password").is_ok());
        assert!(validate_slot_count(0).is_err());
        assert!(validate_slot_count(2).is_ok());
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn amounts_within_money_column_pass() {
        for ok in ["0", "100", "1000.5", "-900.00", "9999999999.99", "12.3400"] {
            assert!(validate_amount(dec(ok), "total_amount").is_ok(), "{ok}");
        }
    }

    #[test]
    fn extra_fraction_digits_are_rejected() {
        let err = validate_amount(dec("1000.005"), "total_amount").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        assert!(err.details.unwrap().contains_key("total_amount"));
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let err = validate_amount(dec("10000000000"), "amount_paid").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        assert!(err.details.unwrap().contains_key("amount_paid"));
        assert!(validate_amount(dec("-10000000000"), "amount_paid").is_err());
    }
}
