//! Field bounds shared by validation and the schema.

use crate::error::AppError;

pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32_000;
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32_000;

pub const USER_FIELD_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const NAME_MAX_LEN: usize = 200;
pub const UNIT_MAX_LEN: usize = 50;

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const INGREDIENT_SEARCH_LIMIT: i64 = 10;

pub fn check_cooking_time(value: i64) -> Result<(), AppError> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&value) {
        return Err(AppError::Validation(format!(
            "cooking_time must be between {} and {} minutes",
            MIN_COOKING_TIME, MAX_COOKING_TIME
        )));
    }
    Ok(())
}

pub fn check_amount(value: i64) -> Result<(), AppError> {
    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&value) {
        return Err(AppError::Validation(format!(
            "ingredient amount must be between {} and {}",
            MIN_AMOUNT, MAX_AMOUNT
        )));
    }
    Ok(())
}

/// Trim `value` and require it to be non-empty and at most `max` characters.
pub fn check_required(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooking_time_bounds() {
        assert!(check_cooking_time(0).is_err());
        assert!(check_cooking_time(1).is_ok());
        assert!(check_cooking_time(32_000).is_ok());
        assert!(check_cooking_time(32_001).is_err());
    }

    #[test]
    fn amount_bounds() {
        assert!(check_amount(0).is_err());
        assert!(check_amount(-5).is_err());
        assert!(check_amount(250).is_ok());
    }

    #[test]
    fn required_trims_and_counts_chars() {
        assert_eq!(check_required("name", "  Borscht ", 200).unwrap(), "Borscht");
        assert!(check_required("name", "   ", 200).is_err());
        // multi-byte characters count once each
        assert!(check_required("name", "щщщ", 3).is_ok());
        assert!(check_required("name", "щщщщ", 3).is_err());
    }
}
