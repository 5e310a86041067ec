//! # eqs-ledger — Share Ledger and Transfers
//!
//! One [`Ledger`] per company. It owns the balance map, the total supply and
//! the shareholder registry, and is the only place those are mutated.
//!
//! ## Invariants
//!
//! - `sum(balances) == total_supply` after every operation. Only minting
//!   changes the total supply.
//! - Every balance and every accepted amount is a multiple of the company's
//!   granularity.
//! - The shareholder registry is append-only and duplicate-free: an account
//!   enters on its first positive balance and is never removed, even when
//!   its balance later returns to zero.
//!
//! ## Validate, then commit
//!
//! Each mutation computes the complete post-state first and only writes once
//! every check has passed. A rejected call leaves the ledger untouched. The
//! supply invariant is recomputed after each write; a mismatch undoes the
//! write and surfaces as [`LedgerError::SupplyMismatch`].
//!
//! Authorization (who may mint, whether issuance was cleared, who may send)
//! is decided by the caller of this crate; the ledger enforces arithmetic and
//! registry rules only.

pub mod ledger;
pub mod transfer;

pub use ledger::{Ledger, LedgerError, MintReceipt, NewHolder};
pub use transfer::{TransferReceipt, TransferRequest};
