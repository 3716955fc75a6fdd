//! Request validation helpers shared by the action endpoints. Each returns a
//! typed value or an `InvalidInput` error naming the offending field.

use super::errors::{BusinessError, BusinessResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn required<T>(field: &str, value: Option<T>) -> BusinessResult<T> {
    value.ok_or_else(|| BusinessError::InvalidInput {
        field: field.to_string(),
        message: format!("{field} is required"),
    })
}

pub fn required_text(field: &str, value: Option<String>) -> BusinessResult<String> {
    let value = required(field, value)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::invalid_input!(field, format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

pub fn parse_date(field: &str, value: &str) -> BusinessResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        crate::invalid_input!(field, format!("{field} must be a date formatted as YYYY-MM-DD"))
    })
}

pub fn positive_decimal(field: &str, value: Option<Decimal>) -> BusinessResult<Decimal> {
    let value = required(field, value)?;
    if value <= Decimal::ZERO {
        return Err(crate::invalid_input!(field, format!("{field} must be greater than zero")));
    }
    Ok(value)
}
