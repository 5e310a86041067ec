//! # Engine Errors
//!
//! Every failure is returned to the caller synchronously and leaves engine
//! state unchanged. Nothing is retried here: a retried mint would mint
//! twice.
//!
//! [`EngineError`] keeps the structured domain errors; [`ErrorKind`]
//! flattens them to the stable names callers match on.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eqs_core::{AccountId, CompanyName, ValidationError};
use eqs_ledger::LedgerError;
use eqs_state::{BallotError, IssuanceError};

use crate::roles::Role;

/// Errors returned by [`EquityEngine`](crate::EquityEngine) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The caller does not hold the role the operation requires.
    #[error("{account} is not authorized as {role}")]
    Unauthorized {
        /// The calling account.
        account: AccountId,
        /// The required role.
        role: Role,
    },

    /// A company with this name already exists.
    #[error("company name {name} is already taken")]
    DuplicateName {
        /// The contested name.
        name: CompanyName,
    },

    /// No company with this name exists.
    #[error("company {name} not found")]
    NotFound {
        /// The requested name.
        name: CompanyName,
    },

    /// An argument failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The ledger rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The issuance lifecycle rejected the operation.
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    /// The ballot rejected the operation.
    #[error(transparent)]
    Ballot(#[from] BallotError),
}

impl EngineError {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::DuplicateName { .. } => ErrorKind::DuplicateName,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::InvalidArgument,
            Self::Ledger(e) => match e {
                LedgerError::GranularityViolation { .. } => ErrorKind::GranularityViolation,
                LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
                LedgerError::InvalidRecipient { .. } => ErrorKind::InvalidRecipient,
                LedgerError::SupplyOverflow { .. } => ErrorKind::SupplyOverflow,
                LedgerError::SupplyMismatch { .. } | LedgerError::DuplicateHolder { .. } => {
                    ErrorKind::InvariantViolation
                }
            },
            Self::Issuance(e) => match e {
                IssuanceError::NotCleared { .. } => ErrorKind::NotCleared,
                IssuanceError::AlreadyMinted { .. } => ErrorKind::AlreadyMinted,
                IssuanceError::NotPending { .. } => ErrorKind::NotFound,
            },
            Self::Ballot(e) => match e {
                BallotError::AlreadyStarted => ErrorKind::AlreadyStarted,
                BallotError::NotOpen => ErrorKind::BallotNotOpen,
                BallotError::NoProposals | BallotError::InvalidName(_) => {
                    ErrorKind::InvalidArgument
                }
                BallotError::InvalidProposal { .. } => ErrorKind::InvalidProposal,
                BallotError::AlreadyVoted { .. } => ErrorKind::AlreadyVoted,
                BallotError::DelegationCycle { .. } => ErrorKind::DelegationCycle,
            },
        }
    }
}

/// Flat classification of [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Role mismatch (owner, advocate or holder check).
    Unauthorized,
    /// Company name already taken.
    DuplicateName,
    /// Company or pending issuance request does not exist.
    NotFound,
    /// Mint before advocate clearance.
    NotCleared,
    /// Second mint under the single-issue policy.
    AlreadyMinted,
    /// Amount not a multiple of the granularity.
    GranularityViolation,
    /// Sender balance too low.
    InsufficientBalance,
    /// Recipient is the zero account.
    InvalidRecipient,
    /// Proposal index out of range.
    InvalidProposal,
    /// Account already voted or delegated.
    AlreadyVoted,
    /// A ballot is already open.
    AlreadyStarted,
    /// Malformed identifier, zero granularity or empty proposal list.
    InvalidArgument,
    /// No ballot is open.
    BallotNotOpen,
    /// Delegation would form a loop.
    DelegationCycle,
    /// Supply counter would overflow.
    SupplyOverflow,
    /// Ledger totals disagree.
    InvariantViolation,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 16] = [
        Self::Unauthorized,
        Self::DuplicateName,
        Self::NotFound,
        Self::NotCleared,
        Self::AlreadyMinted,
        Self::GranularityViolation,
        Self::InsufficientBalance,
        Self::InvalidRecipient,
        Self::InvalidProposal,
        Self::AlreadyVoted,
        Self::AlreadyStarted,
        Self::InvalidArgument,
        Self::BallotNotOpen,
        Self::DelegationCycle,
        Self::SupplyOverflow,
        Self::InvariantViolation,
    ];

    /// The kind's name, e.g. `"NotCleared"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::DuplicateName => "DuplicateName",
            Self::NotFound => "NotFound",
            Self::NotCleared => "NotCleared",
            Self::AlreadyMinted => "AlreadyMinted",
            Self::GranularityViolation => "GranularityViolation",
            Self::InsufficientBalance => "InsufficientBalance",
            Self::InvalidRecipient => "InvalidRecipient",
            Self::InvalidProposal => "InvalidProposal",
            Self::AlreadyVoted => "AlreadyVoted",
            Self::AlreadyStarted => "AlreadyStarted",
            Self::InvalidArgument => "InvalidArgument",
            Self::BallotNotOpen => "BallotNotOpen",
            Self::DelegationCycle => "DelegationCycle",
            Self::SupplyOverflow => "SupplyOverflow",
            Self::InvariantViolation => "InvariantViolation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown error kind {s:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqs_core::Granularity;

    #[test]
    fn ledger_errors_map_to_kinds() {
        let e: EngineError = LedgerError::GranularityViolation {
            amount: 3,
            granularity: Granularity::new(2).unwrap(),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::GranularityViolation);
    }

    #[test]
    fn not_pending_is_not_found() {
        let e: EngineError = IssuanceError::NotPending {
            company: CompanyName::new("TestCompany").unwrap(),
            state: eqs_state::IssuanceState::Minted,
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.as_str().parse::<ErrorKind>().unwrap(), kind);
        }
        assert_eq!("notcleared".parse::<ErrorKind>().unwrap(), ErrorKind::NotCleared);
        assert!("Nope".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn display_includes_context() {
        let e = EngineError::Unauthorized {
            account: AccountId::new("investor").unwrap(),
            role: Role::Owner,
        };
        assert_eq!(e.to_string(), "investor is not authorized as owner");
    }
}
