//! # Role Table
//!
//! Who may do what, checked in one place. Each company has a table naming
//! its owner and, once cleared, its compliance officer. Advocates are
//! engine-wide: they clear requests for companies that have no officer yet.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use eqs_core::AccountId;

/// A role an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The company's issuing owner.
    Owner,
    /// An engine-wide compliance advocate.
    Advocate,
    /// The account whose shares are being moved.
    Holder,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Owner => "owner",
            Self::Advocate => "advocate",
            Self::Holder => "holder",
        };
        f.write_str(s)
    }
}

/// Role assignments of a single company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTable {
    /// The issuing owner.
    pub owner: AccountId,
    /// The advocate that cleared the issuance.
    pub compliance_officer: Option<AccountId>,
}

impl RoleTable {
    /// A table with only the owner assigned.
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            compliance_officer: None,
        }
    }

    /// Whether `account` is the owner.
    pub fn is_owner(&self, account: &AccountId) -> bool {
        &self.owner == account
    }
}

/// Engine-wide set of advocate accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvocateRegistry {
    members: BTreeSet<AccountId>,
}

impl AdvocateRegistry {
    /// Registry seeded with `advocates`.
    pub fn new(advocates: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            members: advocates.into_iter().collect(),
        }
    }

    /// Add an advocate. Returns `false` if already present.
    pub fn grant(&mut self, account: AccountId) -> bool {
        self.members.insert(account)
    }

    /// Remove an advocate. Returns `false` if absent.
    pub fn revoke(&mut self, account: &AccountId) -> bool {
        self.members.remove(account)
    }

    /// Whether `account` is an advocate.
    pub fn contains(&self, account: &AccountId) -> bool {
        self.members.contains(account)
    }
}
