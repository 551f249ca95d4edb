//! Ledger configuration

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Institutional prefix of every card issued by this ledger
pub const DEFAULT_CARD_PREFIX: &str = "400000";
/// Random digits between the prefix and the check digit
pub const DEFAULT_BASE_DIGITS: usize = 9;
/// Length of a generated PIN
pub const DEFAULT_PIN_DIGITS: usize = 4;
/// Insert attempts before a card-number collision is reported
pub const DEFAULT_MAX_CREATE_ATTEMPTS: u32 = 5;

/// Tunables for identity generation and account creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub card_prefix: String,
    pub base_digits: usize,
    pub pin_digits: usize,
    pub max_create_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            card_prefix: DEFAULT_CARD_PREFIX.to_string(),
            base_digits: DEFAULT_BASE_DIGITS,
            pin_digits: DEFAULT_PIN_DIGITS,
            max_create_attempts: DEFAULT_MAX_CREATE_ATTEMPTS,
        }
    }
}

impl LedgerConfig {
    /// Total length of a card number, check digit included
    pub fn card_length(&self) -> usize {
        self.card_prefix.len() + self.base_digits + 1
    }

    /// Check the configuration for values that could never produce a valid card
    pub fn validate(&self) -> LedgerResult<()> {
        if self.card_prefix.is_empty() || !self.card_prefix.chars().all(|c| c.is_ascii_digit()) {
            return Err(LedgerError::Validation(format!(
                "Card prefix '{}' must be a non-empty string of digits",
                self.card_prefix
            )));
        }

        if self.base_digits == 0 {
            return Err(LedgerError::Validation(
                "Card numbers need at least one random digit".to_string(),
            ));
        }

        if self.pin_digits == 0 {
            return Err(LedgerError::Validation(
                "PIN length must be positive".to_string(),
            ));
        }

        if self.max_create_attempts == 0 {
            return Err(LedgerError::Validation(
                "At least one account creation attempt is required".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.card_length(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{ "card_prefix": "510000", "pin_digits": 6 }"#).unwrap();
        assert_eq!(config.card_prefix, "510000");
        assert_eq!(config.pin_digits, 6);
        assert_eq!(config.base_digits, DEFAULT_BASE_DIGITS);
        assert_eq!(config.max_create_attempts, DEFAULT_MAX_CREATE_ATTEMPTS);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_prefix = LedgerConfig {
            card_prefix: "40x0".to_string(),
            ..LedgerConfig::default()
        };
        assert!(bad_prefix.validate().is_err());

        let no_attempts = LedgerConfig {
            max_create_attempts: 0,
            ..LedgerConfig::default()
        };
        assert!(no_attempts.validate().is_err());

        let no_pin = LedgerConfig {
            pin_digits: 0,
            ..LedgerConfig::default()
        };
        assert!(no_pin.validate().is_err());
    }
}
