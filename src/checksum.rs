//! Luhn check digit computation and validation
//!
//! Parity is always measured from the right: the digit that will sit next to
//! the check digit is doubled, then every second digit moving left. Generation
//! and validation share [`digit_sum`], so a number produced by
//! [`append_check_digit`] always passes [`is_valid`] whatever its length.

use crate::types::*;

/// Largest value a single weighted digit may keep; doubled digits above it lose 9
const LUHN_MAX: u32 = 9;

/// Weighted digit sum of `digits`, doubling from the rightmost position
fn digit_sum(digits: &str) -> LedgerResult<u32> {
    digits
        .chars()
        .rev()
        .enumerate()
        .try_fold(0u32, |sum, (position, c)| -> LedgerResult<u32> {
            let mut digit = c.to_digit(10).ok_or_else(|| {
                LedgerError::Validation(format!("'{c}' is not a decimal digit"))
            })?;
            if position % 2 == 0 {
                digit *= 2;
                if digit > LUHN_MAX {
                    digit -= LUHN_MAX;
                }
            }
            Ok(sum + digit)
        })
}

/// Compute the check digit to append to `digits`
pub fn check_digit(digits: &str) -> LedgerResult<u8> {
    if digits.is_empty() {
        return Err(LedgerError::Validation(
            "Cannot compute a check digit over an empty number".to_string(),
        ));
    }

    let sum = digit_sum(digits)?;
    Ok(((10 - sum % 10) % 10) as u8)
}

/// Return `base` with its check digit appended
pub fn append_check_digit(base: &str) -> LedgerResult<String> {
    let digit = check_digit(base)?;
    Ok(format!("{base}{digit}"))
}

/// Whether the trailing digit of `number` matches the checksum of the rest.
///
/// Empty input, a lone digit and anything containing a non-digit are invalid.
pub fn is_valid(number: &str) -> bool {
    if number.len() < 2 || !number.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let (base, last) = number.split_at(number.len() - 1);
    match (check_digit(base), last.parse::<u8>()) {
        (Ok(expected), Ok(actual)) => expected == actual,
        _ => false,
    }
}
