use crate::error::{AppError, Result};

/// Spellings that `f64::from_str` accepts but that must never reach a price column.
const NON_FINITE: [&str; 7] = ["nan", "inf", "-inf", "+inf", "infinity", "-infinity", "+infinity"];

/// Largest accepted price, in whole currency units.
const MAX_PRICE: f64 = 1_000_000_000.0;

/// Parse a user-supplied decimal price into integer cents.
pub fn parse_price(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    if NON_FINITE.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Err(AppError::Validation("Invalid price value provided.".into()));
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| AppError::Validation("Price must be a valid number.".into()))?;

    if !value.is_finite() {
        return Err(AppError::Validation("Invalid price value provided.".into()));
    }
    if value < 0.0 {
        return Err(AppError::Validation("Price must be a positive number.".into()));
    }
    if value > MAX_PRICE {
        return Err(AppError::Validation("Price is too large.".into()));
    }

    Ok((value * 100.0).round() as i64)
}

/// Render cents as a decimal amount with two fraction digits.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
