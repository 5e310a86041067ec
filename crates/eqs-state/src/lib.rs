//! # eqs-state — Issuance and Ballot State Machines
//!
//! ## State Machines
//!
//! - **Issuance** (`issuance.rs`): `Requested → Cleared → Minted`. A request
//!   is cleared by an advocate and minted by the company owner. Minting
//!   before clearance is rejected. Repeated mints are governed by
//!   [`MintPolicy`].
//!
//! - **Ballot** (`ballot.rs`): a fixed, ordered set of proposals tallied by
//!   holder balance. Each account votes or delegates at most once per ballot.
//!   [`BallotSlot`] tracks a company's round as `NotStarted`, `Open` or
//!   `Closed`.
//!
//! ## Design
//!
//! Both machines use an enum state with transitions returning `Result`,
//! rather than one type per state: callers store them behind a lock keyed by
//! company and cannot change their static type on each transition.

pub mod ballot;
pub mod issuance;

// ─── Issuance re-exports ────────────────────────────────────────────

pub use issuance::{
    IssuanceError, IssuanceRequest, IssuanceState, IssuanceTransitionRecord, MintPolicy,
};

// ─── Ballot re-exports ──────────────────────────────────────────────

pub use ballot::{
    Ballot, BallotError, BallotOutcome, BallotSlot, DelegationRecord, Proposal, VoteRecord,
    VoterStatus,
};
