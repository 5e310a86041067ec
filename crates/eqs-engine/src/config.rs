//! Engine configuration.
//!
//! Defaults accept repeated (top-up) mints and start with no advocates.
//! Override via environment variables or explicit construction.

use serde::{Deserialize, Serialize};

use eqs_core::{AccountId, ValidationError};
use eqs_state::MintPolicy;

/// Environment variable selecting the mint policy.
pub const ENV_MINT_POLICY: &str = "EQS_MINT_POLICY";

/// Environment variable listing advocate accounts, comma-separated.
pub const ENV_ADVOCATES: &str = "EQS_ADVOCATES";

/// Configuration for an [`EquityEngine`](crate::EquityEngine).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether owners may mint again after the initial issuance.
    pub mint_policy: MintPolicy,
    /// Accounts holding the advocate (compliance clearance) role.
    pub advocates: Vec<AccountId>,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `EQS_MINT_POLICY`: `top-up` (default) or `single-issue`
    /// - `EQS_ADVOCATES`: comma-separated advocate accounts (default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mint_policy = match lookup(ENV_MINT_POLICY) {
            Some(raw) if !raw.trim().is_empty() => raw
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: ENV_MINT_POLICY,
                    reason,
                })?,
            _ => MintPolicy::default(),
        };

        let advocates = match lookup(ENV_ADVOCATES) {
            Some(raw) => raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(AccountId::new)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::InvalidAccount {
                    var: ENV_ADVOCATES,
                    source: e,
                })?,
            None => Vec::new(),
        };

        Ok(Self {
            mint_policy,
            advocates,
        })
    }

    /// Builder-style override of the mint policy.
    pub fn with_mint_policy(mut self, policy: MintPolicy) -> Self {
        self.mint_policy = policy;
        self
    }

    /// Builder-style addition of an advocate.
    pub fn with_advocate(mut self, advocate: AccountId) -> Self {
        if !self.advocates.contains(&advocate) {
            self.advocates.push(advocate);
        }
        self
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// An entry of an account list was rejected.
    #[error("invalid account in {var}: {source}")]
    InvalidAccount {
        /// The variable name.
        var: &'static str,
        /// The validation failure.
        source: ValidationError,
    },
}
