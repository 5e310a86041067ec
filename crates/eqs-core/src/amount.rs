//! # Share Amounts and Granularity
//!
//! Amounts are unsigned integer counts of the smallest share unit. Every
//! balance and every accepted mint or transfer amount is a multiple of the
//! company's granularity.

use std::num::NonZeroU128;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A quantity of shares, in the smallest unit.
pub type Amount = u128;

/// Minimum indivisible unit of a company's share class.
///
/// Non-zero by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u128", into = "u128")]
pub struct Granularity(NonZeroU128);

impl Granularity {
    /// A granularity of one unit: every integer amount is valid.
    pub const ONE: Granularity = Granularity(NonZeroU128::MIN);

    /// Create a granularity, rejecting zero.
    pub fn new(units: u128) -> Result<Self, ValidationError> {
        NonZeroU128::new(units)
            .map(Self)
            .ok_or(ValidationError::ZeroGranularity)
    }

    /// The granularity as a plain integer.
    pub fn get(&self) -> u128 {
        self.0.get()
    }

    /// Whether `amount` is an integer multiple of this granularity.
    pub fn divides(&self, amount: Amount) -> bool {
        amount % self.0.get() == 0
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u128> for Granularity {
    type Error = ValidationError;

    fn try_from(value: u128) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Granularity> for u128 {
    fn from(value: Granularity) -> Self {
        value.get()
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
