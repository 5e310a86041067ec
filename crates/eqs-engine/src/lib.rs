//! # eqs-engine — Issuance and Governance Engine
//!
//! [`EquityEngine`] is the only type callers talk to. It keeps a registry of
//! companies keyed by name and, per company, a role table, an issuance
//! request, a ledger, a ballot slot and a disclosure channel.
//!
//! ## Lifecycle
//!
//! ```text
//! create_token ─► clear_request ─► mint ─► send / send_message / ballot
//!   (owner)         (advocate)     (owner)
//! ```
//!
//! ## Concurrency
//!
//! Every mutation holds the company's write lock from the authorization
//! check through event emission. Two racing transfers out of one account
//! are serialized, so at most one can spend a given balance. Reads take the
//! read lock and never observe a half-applied change.
//!
//! ## Crate Policy
//!
//! - Every failure is an [`EngineError`]; [`EngineError::kind`] gives the
//!   flat [`ErrorKind`].
//! - A rejected call changes nothing and emits nothing.
//! - Successful mutations log at `info`, rejections at `warn`, event
//!   emission at `debug`.

pub mod company;
pub mod config;
pub mod engine;
pub mod error;
pub mod roles;

pub use company::{Company, CompanyBook, CompanySnapshot};
pub use config::{ConfigError, EngineConfig};
pub use engine::{EquityEngine, MintMetadata};
pub use error::{EngineError, ErrorKind};
pub use roles::{AdvocateRegistry, Role, RoleTable};
