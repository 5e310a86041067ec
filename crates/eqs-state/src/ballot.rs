//! # Ballot
//!
//! One round of balance-weighted proposal voting for a company.
//!
//! ## Rules
//!
//! - The proposal set is fixed when the ballot opens; index = position.
//! - A vote adds the voter's balance, read at the moment of voting, to one
//!   proposal. Zero-balance voters cast a zero-weight vote that still counts
//!   as their vote.
//! - Each account votes or delegates at most once.
//! - Delegation forwards an account's weight to another account. The chain
//!   is resolved to its final delegate when delegating; a chain that leads
//!   back to the delegator is rejected. If the final delegate has already
//!   voted, the delegated balance is added to their proposal immediately;
//!   otherwise it is added, at the then-current balance, when they vote.
//!   Every account's balance enters the tally at most once.
//! - The winner is the proposal with the strictly greatest tally. Ties go
//!   to the lowest index.
//!
//! ## Slot
//!
//! ```text
//! NotStarted ──start()──▶ Open ──conclude()──▶ Closed ──start()──▶ Open
//! ```
//!
//! A company has at most one open ballot. Starting while `Open` fails with
//! `AlreadyStarted`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eqs_core::{AccountId, Amount, BalanceSource, ProposalName, Timestamp, ValidationError};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by ballot operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BallotError {
    /// A ballot is already open.
    #[error("a ballot is already open")]
    AlreadyStarted,

    /// No ballot is open.
    #[error("no ballot is open")]
    NotOpen,

    /// A ballot needs at least one proposal.
    #[error("a ballot needs at least one proposal")]
    NoProposals,

    /// A proposal name was rejected.
    #[error("invalid proposal name: {0}")]
    InvalidName(#[from] ValidationError),

    /// Proposal index is out of range.
    #[error("proposal index {index} out of range, ballot has {count} proposals")]
    InvalidProposal {
        /// The requested index.
        index: usize,
        /// Number of proposals on the ballot.
        count: usize,
    },

    /// The account already voted or delegated in this ballot.
    #[error("{voter} has already voted in this ballot")]
    AlreadyVoted {
        /// The account.
        voter: AccountId,
    },

    /// Delegation would form a loop.
    #[error("delegation from {from} to {to} would form a cycle")]
    DelegationCycle {
        /// The delegating account.
        from: AccountId,
        /// The requested delegate.
        to: AccountId,
    },
}

// ─── Records ─────────────────────────────────────────────────────────

/// A proposal and its running tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal name.
    pub name: ProposalName,
    /// Accumulated vote weight.
    pub vote_count: Amount,
}

/// A cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    /// The voting account.
    pub voter: AccountId,
    /// Index of the chosen proposal.
    pub proposal: usize,
    /// Weight added, including delegated balances.
    pub weight: Amount,
}

/// A completed delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRecord {
    /// The delegating account.
    pub from: AccountId,
    /// The final delegate after resolving the chain.
    pub to: AccountId,
    /// Weight added to a tally immediately, when the delegate had already voted.
    pub applied_weight: Option<Amount>,
}

/// How an account used its vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoterStatus {
    /// Voted directly for a proposal.
    Voted {
        /// Index of the chosen proposal.
        proposal: usize,
        /// Weight contributed so far.
        weight: Amount,
    },
    /// Handed the vote to another account.
    Delegated {
        /// The final delegate.
        to: AccountId,
    },
}

/// Result of a concluded ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotOutcome {
    /// Index of the winning proposal.
    pub winner_index: usize,
    /// Name of the winning proposal.
    pub winner_name: ProposalName,
    /// Tally of the winning proposal.
    pub vote_count: Amount,
    /// Final tallies of every proposal.
    pub proposals: Vec<Proposal>,
    /// When the ballot was concluded.
    pub concluded_at: Timestamp,
}

// ─── Ballot ──────────────────────────────────────────────────────────

/// An open voting round.
///
/// Deserialization applies the same checks as [`Ballot::new`], and also
/// rejects a recorded vote that points past the proposal list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BallotRecord")]
pub struct Ballot {
    proposals: Vec<Proposal>,
    voters: BTreeMap<AccountId, VoterStatus>,
    /// Delegate → accounts whose weight is waiting for the delegate's vote.
    pending_delegations: BTreeMap<AccountId, Vec<AccountId>>,
}

#[derive(Deserialize)]
struct BallotRecord {
    proposals: Vec<Proposal>,
    voters: BTreeMap<AccountId, VoterStatus>,
    pending_delegations: BTreeMap<AccountId, Vec<AccountId>>,
}

impl TryFrom<BallotRecord> for Ballot {
    type Error = BallotError;

    fn try_from(record: BallotRecord) -> Result<Self, Self::Error> {
        let count = record.proposals.len();
        if count == 0 {
            return Err(BallotError::NoProposals);
        }
        for status in record.voters.values() {
            if let VoterStatus::Voted { proposal, .. } = status {
                if *proposal >= count {
                    return Err(BallotError::InvalidProposal {
                        index: *proposal,
                        count,
                    });
                }
            }
        }
        Ok(Self {
            proposals: record.proposals,
            voters: record.voters,
            pending_delegations: record.pending_delegations,
        })
    }
}

impl Ballot {
    /// Open a ballot over `names`, in order, each starting at zero.
    pub fn new<I, S>(names: I) -> Result<Self, BallotError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let proposals = names
            .into_iter()
            .map(|n| -> Result<Proposal, BallotError> {
                Ok(Proposal {
                    name: ProposalName::new(n)?,
                    vote_count: 0,
                })
            })
            .collect::<Result<Vec<_>, BallotError>>()?;
        if proposals.is_empty() {
            return Err(BallotError::NoProposals);
        }
        Ok(Self {
            proposals,
            voters: BTreeMap::new(),
            pending_delegations: BTreeMap::new(),
        })
    }

    /// Proposals and their tallies, in ballot order.
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Tally of the proposal at `index`.
    pub fn vote_count(&self, index: usize) -> Result<Amount, BallotError> {
        self.proposals
            .get(index)
            .map(|p| p.vote_count)
            .ok_or(BallotError::InvalidProposal {
                index,
                count: self.proposals.len(),
            })
    }

    /// Whether `account` has voted or delegated.
    pub fn has_voted(&self, account: &AccountId) -> bool {
        self.voters.contains_key(account)
    }

    /// Cast `voter`'s vote for the proposal at `index`.
    ///
    /// Weight is the voter's balance plus the balances of every account
    /// currently delegating to them, all read from `balances` now.
    pub fn vote(
        &mut self,
        voter: &AccountId,
        index: usize,
        balances: &impl BalanceSource,
    ) -> Result<VoteRecord, BallotError> {
        if self.has_voted(voter) {
            return Err(BallotError::AlreadyVoted {
                voter: voter.clone(),
            });
        }
        if index >= self.proposals.len() {
            return Err(BallotError::InvalidProposal {
                index,
                count: self.proposals.len(),
            });
        }

        let delegators = self.pending_delegations.remove(voter).unwrap_or_default();
        let weight = delegators
            .iter()
            .map(|d| balances.balance_of(d))
            .fold(balances.balance_of(voter), Amount::saturating_add);

        let proposal = &mut self.proposals[index];
        proposal.vote_count = proposal.vote_count.saturating_add(weight);
        self.voters.insert(
            voter.clone(),
            VoterStatus::Voted {
                proposal: index,
                weight,
            },
        );
        Ok(VoteRecord {
            voter: voter.clone(),
            proposal: index,
            weight,
        })
    }

    /// Hand `from`'s vote to `to`.
    pub fn delegate(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        balances: &impl BalanceSource,
    ) -> Result<DelegationRecord, BallotError> {
        if self.has_voted(from) {
            return Err(BallotError::AlreadyVoted {
                voter: from.clone(),
            });
        }
        let target = self.resolve_delegate(from, to)?;

        // `from` carries its own weight plus anything already delegated to it.
        let mut carried = self.pending_delegations.remove(from).unwrap_or_default();
        carried.push(from.clone());

        let applied_weight = match self.voters.get_mut(&target) {
            Some(VoterStatus::Voted { proposal, weight }) => {
                let added = carried
                    .iter()
                    .map(|a| balances.balance_of(a))
                    .fold(0, Amount::saturating_add);
                *weight = weight.saturating_add(added);
                let p = &mut self.proposals[*proposal];
                p.vote_count = p.vote_count.saturating_add(added);
                Some(added)
            }
            _ => {
                self.pending_delegations
                    .entry(target.clone())
                    .or_default()
                    .extend(carried);
                None
            }
        };

        self.voters.insert(
            from.clone(),
            VoterStatus::Delegated { to: target.clone() },
        );
        Ok(DelegationRecord {
            from: from.clone(),
            to: target,
            applied_weight,
        })
    }

    /// Index of the proposal with the strictly greatest tally; ties go to the
    /// lowest index.
    pub fn winning_proposal(&self) -> usize {
        let mut winner = 0;
        for (i, p) in self.proposals.iter().enumerate().skip(1) {
            if p.vote_count > self.proposals[winner].vote_count {
                winner = i;
            }
        }
        winner
    }

    /// Close the ballot and report the result.
    pub fn conclude(self) -> BallotOutcome {
        let winner_index = self.winning_proposal();
        let winner = &self.proposals[winner_index];
        BallotOutcome {
            winner_index,
            winner_name: winner.name.clone(),
            vote_count: winner.vote_count,
            proposals: self.proposals.clone(),
            concluded_at: Timestamp::now(),
        }
    }

    /// Follow `to`'s delegation chain to its end, rejecting loops back to `from`.
    fn resolve_delegate(&self, from: &AccountId, to: &AccountId) -> Result<AccountId, BallotError> {
        let cycle = || BallotError::DelegationCycle {
            from: from.clone(),
            to: to.clone(),
        };
        let mut target = to;
        // Each step moves to a distinct account, so the walk is bounded by
        // the number of voters.
        for _ in 0..=self.voters.len() {
            if target == from {
                return Err(cycle());
            }
            match self.voters.get(target) {
                Some(VoterStatus::Delegated { to: next }) => target = next,
                _ => return Ok(target.clone()),
            }
        }
        Err(cycle())
    }
}

// ─── Ballot Slot ─────────────────────────────────────────────────────

/// A company's current voting round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum BallotSlot {
    /// No ballot has been started yet.
    #[default]
    NotStarted,
    /// A ballot is open for voting.
    Open(Ballot),
    /// The last ballot has been concluded.
    Closed(BallotOutcome),
}

impl BallotSlot {
    /// Open a new ballot over `names`.
    pub fn start<I, S>(&mut self, names: I) -> Result<&Ballot, BallotError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if matches!(self, Self::Open(_)) {
            return Err(BallotError::AlreadyStarted);
        }
        *self = Self::Open(Ballot::new(names)?);
        self.open()
    }

    /// The open ballot.
    pub fn open(&self) -> Result<&Ballot, BallotError> {
        match self {
            Self::Open(b) => Ok(b),
            _ => Err(BallotError::NotOpen),
        }
    }

    /// The open ballot, mutably.
    pub fn open_mut(&mut self) -> Result<&mut Ballot, BallotError> {
        match self {
            Self::Open(b) => Ok(b),
            _ => Err(BallotError::NotOpen),
        }
    }

    /// Conclude the open ballot, leaving the slot `Closed`.
    pub fn conclude(&mut self) -> Result<BallotOutcome, BallotError> {
        match std::mem::take(self) {
            Self::Open(ballot) => {
                let outcome = ballot.conclude();
                *self = Self::Closed(outcome.clone());
                Ok(outcome)
            }
            other => {
                *self = other;
                Err(BallotError::NotOpen)
            }
        }
    }

    /// Current winner: live from the open ballot, or the recorded result of
    /// the last concluded one.
    pub fn winning_proposal(&self) -> Result<(usize, &Proposal), BallotError> {
        match self {
            Self::Open(b) => {
                let i = b.winning_proposal();
                Ok((i, &b.proposals()[i]))
            }
            Self::Closed(outcome) => outcome
                .proposals
                .get(outcome.winner_index)
                .map(|p| (outcome.winner_index, p))
                .ok_or(BallotError::InvalidProposal {
                    index: outcome.winner_index,
                    count: outcome.proposals.len(),
                }),
            Self::NotStarted => Err(BallotError::NotOpen),
        }
    }

    /// Whether a ballot is currently open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
