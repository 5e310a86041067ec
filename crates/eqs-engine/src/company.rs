//! # Company Book
//!
//! Everything the engine keeps for one company, guarded by one lock:
//! the registration record, role table, issuance request, ledger, ballot
//! slot and disclosure channel.

use serde::{Deserialize, Serialize};

use eqs_core::{AccountId, Amount, CompanyId, CompanyName, Granularity, Ticker, Timestamp};
use eqs_events::{DisclosureChannel, DisclosureMessage};
use eqs_ledger::Ledger;
use eqs_state::{BallotOutcome, BallotSlot, IssuanceRequest, IssuanceState, Proposal};

use crate::roles::RoleTable;

/// A registered company and its share class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Engine-assigned identifier.
    pub id: CompanyId,
    /// Unique registered name.
    pub name: CompanyName,
    /// Trading symbol.
    pub ticker: Ticker,
    /// Smallest transferable unit.
    pub granularity: Granularity,
    /// Issuing owner.
    pub owner: AccountId,
    /// When the token was requested.
    pub created_at: Timestamp,
}

/// Mutable per-company state.
#[derive(Debug)]
pub struct CompanyBook {
    pub(crate) company: Company,
    pub(crate) roles: RoleTable,
    pub(crate) issuance: IssuanceRequest,
    pub(crate) ledger: Ledger,
    pub(crate) ballot: BallotSlot,
    pub(crate) disclosures: DisclosureChannel,
}

impl CompanyBook {
    pub(crate) fn new(company: Company) -> Self {
        Self {
            roles: RoleTable::new(company.owner.clone()),
            issuance: IssuanceRequest::new(company.id, company.name.clone()),
            ledger: Ledger::new(company.id, company.granularity),
            ballot: BallotSlot::default(),
            disclosures: DisclosureChannel::new(),
            company,
        }
    }

    /// The registration record.
    pub fn company(&self) -> &Company {
        &self.company
    }

    /// The role table.
    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    /// The issuance request.
    pub fn issuance(&self) -> &IssuanceRequest {
        &self.issuance
    }

    /// The ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The ballot slot.
    pub fn ballot(&self) -> &BallotSlot {
        &self.ballot
    }

    /// The disclosure log.
    pub fn disclosures(&self) -> &DisclosureChannel {
        &self.disclosures
    }

    /// A consistent, owned copy of the book.
    pub fn snapshot(&self) -> CompanySnapshot {
        let (ballot_open, proposals, last_outcome) = match &self.ballot {
            BallotSlot::NotStarted => (false, Vec::new(), None),
            BallotSlot::Open(b) => (true, b.proposals().to_vec(), None),
            BallotSlot::Closed(outcome) => (false, outcome.proposals.clone(), Some(outcome.clone())),
        };
        CompanySnapshot {
            company: self.company.clone(),
            compliance_officer: self.roles.compliance_officer.clone(),
            issuance_state: self.issuance.state,
            mint_count: self.issuance.mint_count,
            total_supply: self.ledger.total_supply(),
            balances: self
                .ledger
                .balances()
                .map(|(a, b)| (a.clone(), b))
                .collect(),
            registry: self.ledger.registry_snapshot(),
            ballot_open,
            proposals,
            last_outcome,
            disclosures: self.disclosures.messages().to_vec(),
        }
    }
}

/// Serializable point-in-time view of a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySnapshot {
    /// The registration record.
    pub company: Company,
    /// Advocate that cleared the issuance request.
    pub compliance_officer: Option<AccountId>,
    /// Current issuance lifecycle state.
    pub issuance_state: IssuanceState,
    /// Number of successful mints.
    pub mint_count: u32,
    /// Total shares in existence.
    pub total_supply: Amount,
    /// Positive balances in account order.
    pub balances: Vec<(AccountId, Amount)>,
    /// Shareholder registry in entry order.
    pub registry: Vec<AccountId>,
    /// Whether a ballot is open.
    pub ballot_open: bool,
    /// Proposals of the open ballot, or of the last concluded one.
    pub proposals: Vec<Proposal>,
    /// Result of the last concluded ballot.
    pub last_outcome: Option<BallotOutcome>,
    /// Published disclosures, oldest first.
    pub disclosures: Vec<DisclosureMessage>,
}
