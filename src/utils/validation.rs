//! Validation utilities

use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: i64) -> LedgerResult<()> {
    if amount <= 0 {
        Err(LedgerError::InvalidAmount(amount))
    } else {
        Ok(())
    }
}

/// Validate that a string is a non-empty run of ASCII digits
pub fn validate_numeric(value: &str, what: &str) -> LedgerResult<()> {
    if value.is_empty() {
        return Err(LedgerError::Validation(format!("{what} is empty")));
    }

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::Validation(format!(
            "{what} can only contain digits"
        )));
    }

    Ok(())
}

/// Parse user-entered amount text into minor units
pub fn parse_amount(input: &str) -> LedgerResult<i64> {
    let amount: i64 = input
        .trim()
        .parse()
        .map_err(|_| LedgerError::Validation(format!("'{}' is not a whole amount", input.trim())))?;
    validate_positive_amount(amount)?;
    Ok(amount)
}
