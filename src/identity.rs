//! Card number and PIN generation
//!
//! Randomness is passed in on every call so callers decide where it comes
//! from: an entropy-seeded generator in production, a seeded one in tests.

use rand::Rng;

use crate::checksum;
use crate::config::LedgerConfig;
use crate::types::*;

/// A freshly generated card identity, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIdentity {
    pub number: String,
    pub pin: String,
}

/// Produces card numbers (prefix + random digits + check digit) and PINs
#[derive(Debug, Clone)]
pub struct IdentityGenerator {
    prefix: String,
    base_digits: usize,
    pin_digits: usize,
}

impl IdentityGenerator {
    /// Create a generator from a validated configuration
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            prefix: config.card_prefix.clone(),
            base_digits: config.base_digits,
            pin_digits: config.pin_digits,
        })
    }

    /// Generate a new card number
    pub fn new_account_number<R: Rng + ?Sized>(&self, rng: &mut R) -> LedgerResult<String> {
        let base = format!("{}{}", self.prefix, random_digits(rng, self.base_digits));
        checksum::append_check_digit(&base)
    }

    /// Generate a new zero-padded PIN
    pub fn new_pin<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        random_digits(rng, self.pin_digits)
    }

    /// Generate a number and PIN pair
    pub fn new_identity<R: Rng + ?Sized>(&self, rng: &mut R) -> LedgerResult<CardIdentity> {
        let number = self.new_account_number(rng)?;
        let pin = self.new_pin(rng);
        Ok(CardIdentity { number, pin })
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        let config = LedgerConfig::default();
        Self {
            prefix: config.card_prefix,
            base_digits: config.base_digits,
            pin_digits: config.pin_digits,
        }
    }
}

/// Uniformly distributed decimal string of exactly `len` digits
fn random_digits<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
