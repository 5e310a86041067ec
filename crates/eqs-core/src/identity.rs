//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers of the Equity Stack. You cannot pass
//! a `Ticker` where a `CompanyName` is expected, or an arbitrary string where
//! an `AccountId` is expected.
//!
//! Company names and tickers are limited to 32 bytes, the width of the
//! fixed-size fields they are published in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum encoded length of a company name or ticker, in bytes.
pub const MAX_SYMBOL_BYTES: usize = 32;

/// Unique random identifier assigned to a company at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub Uuid);

impl CompanyId {
    /// Generate a new random company identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "company:{}", self.0)
    }
}

/// A holder or operator account.
///
/// Accounts are opaque strings (typically a hex address). The all-zero
/// address is reserved and can never receive shares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// The reserved zero account.
    pub const ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    /// Create an account identifier, rejecting empty input.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { kind: "account" });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The reserved zero account.
    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    /// Whether this is the reserved zero account.
    ///
    /// Any `0x`-prefixed string consisting only of zeros counts.
    pub fn is_zero(&self) -> bool {
        match self.0.strip_prefix("0x").or_else(|| self.0.strip_prefix("0X")) {
            Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b == b'0'),
            None => false,
        }
    }

    /// The account as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered company name. Unique across the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompanyName(String);

impl CompanyName {
    /// Create a company name, rejecting empty or over-long input.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        validate_symbol(raw.into(), "company name").map(Self)
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CompanyName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CompanyName> for String {
    fn from(value: CompanyName) -> Self {
        value.0
    }
}

impl std::fmt::Display for CompanyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trading symbol of a company's share class (e.g. `TCO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Create a ticker, rejecting empty or over-long input.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        validate_symbol(raw.into(), "ticker").map(Self)
    }

    /// The ticker as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a ballot proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProposalName(String);

impl ProposalName {
    /// Create a proposal name, rejecting empty or over-long input.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        validate_symbol(raw.into(), "proposal name").map(Self)
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProposalName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProposalName> for String {
    fn from(value: ProposalName) -> Self {
        value.0
    }
}

impl std::fmt::Display for ProposalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque tag carried by a transfer for downstream compliance classification.
///
/// Not an accounting partition: balances are never split by tranche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrancheId(pub u64);

impl std::fmt::Display for TrancheId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tranche:{}", self.0)
    }
}

fn validate_symbol(raw: String, kind: &'static str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { kind });
    }
    if trimmed.len() > MAX_SYMBOL_BYTES {
        return Err(ValidationError::TooLong {
            kind,
            value: trimmed.to_string(),
            len: trimmed.len(),
            max: MAX_SYMBOL_BYTES,
        });
    }
    Ok(trimmed.to_string())
}
