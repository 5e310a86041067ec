//! # eqs-core — Foundational Types for the Equity Stack
//!
//! This crate defines the primitives every other crate in the workspace
//! builds on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `CompanyId`, `AccountId`,
//!    `CompanyName`, `Ticker`, `ProposalName`, `TrancheId` are all distinct types with
//!    validated constructors. No bare strings for identifiers.
//!
//! 2. **Integer share amounts.** `Amount` is a `u128` count of the smallest
//!    unit. `Granularity` is non-zero by construction, so divisibility checks
//!    can never divide by zero.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC, truncated to seconds.
//!
//! 4. **One balance seam.** `BalanceSource` is the only way vote weighting
//!    reads balances, so the ballot never depends on the ledger crate.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `eqs-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod balance;
pub mod error;
pub mod identity;
pub mod temporal;

pub use amount::{Amount, Granularity};
pub use balance::BalanceSource;
pub use error::ValidationError;
pub use identity::{AccountId, CompanyId, CompanyName, ProposalName, Ticker, TrancheId};
pub use temporal::Timestamp;
