//! # Event Payloads
//!
//! The six events any caller-facing boundary reproduces. Field names
//! serialize in camelCase (`companyName`, `totalShareholderCount`, …).

use serde::{Deserialize, Serialize};

use eqs_core::{AccountId, Amount, CompanyId, CompanyName, ProposalName, Timestamp, TrancheId};

/// An observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquityEvent {
    /// A company's share class was requested.
    #[serde(rename_all = "camelCase")]
    TokenIssued {
        /// Registered company name.
        company_name: CompanyName,
        /// Issuing owner.
        company_owner: AccountId,
    },

    /// An account entered the shareholder registry.
    #[serde(rename_all = "camelCase")]
    ShareholderAdded {
        /// The new holder.
        new_shareholder: AccountId,
        /// Registry length after the append.
        total_shareholder_count: usize,
    },

    /// Shares moved between holders.
    #[serde(rename_all = "camelCase")]
    Transferred {
        /// Debited account.
        from: AccountId,
        /// Credited account.
        to: AccountId,
        /// Shares moved.
        amount: Amount,
        /// Classification tag of the transfer.
        tranche_id: TrancheId,
    },

    /// New shares were created.
    #[serde(rename_all = "camelCase")]
    Minted {
        /// Credited account (the company owner).
        to: AccountId,
        /// Shares created.
        amount: Amount,
    },

    /// A company published a disclosure.
    #[serde(rename_all = "camelCase")]
    DisclosureSent {
        /// The message text.
        message: String,
    },

    /// A ballot was concluded.
    #[serde(rename_all = "camelCase")]
    VotingConcluded {
        /// Name of the winning proposal.
        winner_name: ProposalName,
        /// Tally of the winning proposal.
        vote_count: Amount,
    },
}

impl EquityEvent {
    /// The event's name as published (e.g. `"TokenIssued"`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::TokenIssued { .. } => "TokenIssued",
            Self::ShareholderAdded { .. } => "ShareholderAdded",
            Self::Transferred { .. } => "Transferred",
            Self::Minted { .. } => "Minted",
            Self::DisclosureSent { .. } => "DisclosureSent",
            Self::VotingConcluded { .. } => "VotingConcluded",
        }
    }
}

impl std::fmt::Display for EquityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenIssued {
                company_name,
                company_owner,
            } => write!(f, "TokenIssued companyName={company_name} companyOwner={company_owner}"),
            Self::ShareholderAdded {
                new_shareholder,
                total_shareholder_count,
            } => write!(
                f,
                "ShareholderAdded newShareholder={new_shareholder} totalShareholderCount={total_shareholder_count}"
            ),
            Self::Transferred {
                from,
                to,
                amount,
                tranche_id,
            } => write!(
                f,
                "Transferred from={from} to={to} amount={amount} trancheId={}",
                tranche_id.0
            ),
            Self::Minted { to, amount } => write!(f, "Minted to={to} amount={amount}"),
            Self::DisclosureSent { message } => write!(f, "DisclosureSent message={message:?}"),
            Self::VotingConcluded {
                winner_name,
                vote_count,
            } => write!(f, "VotingConcluded winnerName={winner_name} voteCount={vote_count}"),
        }
    }
}

/// An event as stored in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at zero.
    pub sequence: u64,
    /// Company the event belongs to.
    pub company: CompanyId,
    /// Registered name of that company.
    pub company_name: CompanyName,
    /// When the event was appended.
    pub timestamp: Timestamp,
    /// The payload.
    pub event: EquityEvent,
}
