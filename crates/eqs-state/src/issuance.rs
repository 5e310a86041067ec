//! # Issuance Request Lifecycle
//!
//! Two-phase token creation: a company's share class is requested by its
//! issuer, cleared by an advocate (the compliance role), then minted by the
//! issuer.
//!
//! ## States
//!
//! ```text
//! Requested ──clear()──▶ Cleared ──commit_mint()──▶ Minted ──commit_mint()──▶ Minted
//!                                                            (TopUp policy only)
//! ```
//!
//! [`IssuanceRequest::check_mint`] guards both mint transitions. Minting
//! from `Requested` fails with `NotCleared`. Under
//! [`MintPolicy::SingleIssue`], minting from `Minted` fails with
//! `AlreadyMinted`.
//!
//! Who may call each transition is decided by the engine's role table; this
//! module records the actor but does not check it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eqs_core::{AccountId, CompanyId, CompanyName, Timestamp};

// ─── Mint Policy ─────────────────────────────────────────────────────

/// Whether a company may mint again after its initial issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MintPolicy {
    /// Further mints after the first are accepted and increase supply.
    #[default]
    TopUp,
    /// Only one mint per company; later attempts fail with `AlreadyMinted`.
    SingleIssue,
}

impl std::fmt::Display for MintPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopUp => f.write_str("top-up"),
            Self::SingleIssue => f.write_str("single-issue"),
        }
    }
}

impl FromStr for MintPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top-up" | "topup" => Ok(Self::TopUp),
            "single-issue" | "single" => Ok(Self::SingleIssue),
            other => Err(format!(
                "unknown mint policy {other:?}, expected \"top-up\" or \"single-issue\""
            )),
        }
    }
}

// ─── Issuance State ──────────────────────────────────────────────────

/// The lifecycle state of an issuance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuanceState {
    /// Requested by the issuer, awaiting advocate clearance.
    Requested,
    /// Cleared by an advocate, awaiting the first mint.
    Cleared,
    /// Shares have been minted at least once.
    Minted,
}

impl IssuanceState {
    /// Whether the owner may mint in this state under `policy`.
    pub fn can_mint(&self, policy: MintPolicy) -> bool {
        match self {
            Self::Requested => false,
            Self::Cleared => true,
            Self::Minted => policy == MintPolicy::TopUp,
        }
    }
}

impl std::fmt::Display for IssuanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Requested => "REQUESTED",
            Self::Cleared => "CLEARED",
            Self::Minted => "MINTED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors that can occur during issuance transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    /// Mint attempted before an advocate cleared the request.
    #[error("issuance of {company} has not been cleared")]
    NotCleared {
        /// The company name.
        company: CompanyName,
    },

    /// Mint attempted again under the single-issue policy.
    #[error("{company} has already been minted")]
    AlreadyMinted {
        /// The company name.
        company: CompanyName,
    },

    /// Clearance attempted on a request that is no longer pending.
    #[error("no pending issuance request for {company} (state {state})")]
    NotPending {
        /// The company name.
        company: CompanyName,
        /// The state the request is in.
        state: IssuanceState,
    },
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of an issuance state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceTransitionRecord {
    /// State before the transition.
    pub from_state: IssuanceState,
    /// State after the transition.
    pub to_state: IssuanceState,
    /// Account that performed the transition.
    pub actor: AccountId,
    /// When the transition occurred.
    pub timestamp: Timestamp,
}

// ─── Issuance Request ────────────────────────────────────────────────

/// A company's issuance request with its lifecycle state and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuanceRequest {
    /// The company being issued.
    pub company: CompanyId,
    /// Registered company name.
    pub name: CompanyName,
    /// Current lifecycle state.
    pub state: IssuanceState,
    /// When the request was created.
    pub requested_at: Timestamp,
    /// Advocate that cleared the request.
    pub cleared_by: Option<AccountId>,
    /// Number of successful mints.
    pub mint_count: u32,
    /// Ordered log of all state transitions.
    pub transitions: Vec<IssuanceTransitionRecord>,
}

impl IssuanceRequest {
    /// Create a new request in the `Requested` state.
    pub fn new(company: CompanyId, name: CompanyName) -> Self {
        Self {
            company,
            name,
            state: IssuanceState::Requested,
            requested_at: Timestamp::now(),
            cleared_by: None,
            mint_count: 0,
            transitions: Vec::new(),
        }
    }

    /// Clear the request (REQUESTED → CLEARED).
    pub fn clear(&mut self, advocate: &AccountId) -> Result<(), IssuanceError> {
        if self.state != IssuanceState::Requested {
            return Err(IssuanceError::NotPending {
                company: self.name.clone(),
                state: self.state,
            });
        }
        self.cleared_by = Some(advocate.clone());
        self.do_transition(IssuanceState::Cleared, advocate);
        Ok(())
    }

    /// Check that a mint is allowed now, without changing state.
    pub fn check_mint(&self, policy: MintPolicy) -> Result<(), IssuanceError> {
        match self.state {
            IssuanceState::Requested => Err(IssuanceError::NotCleared {
                company: self.name.clone(),
            }),
            state if state.can_mint(policy) => Ok(()),
            _ => Err(IssuanceError::AlreadyMinted {
                company: self.name.clone(),
            }),
        }
    }

    /// Record a mint that [`check_mint`](Self::check_mint) already allowed.
    ///
    /// Apply the ledger mint between the check and this call.
    pub fn commit_mint(&mut self, owner: &AccountId) {
        self.mint_count = self.mint_count.saturating_add(1);
        self.do_transition(IssuanceState::Minted, owner);
    }

    fn do_transition(&mut self, to: IssuanceState, actor: &AccountId) {
        self.transitions.push(IssuanceTransitionRecord {
            from_state: self.state,
            to_state: to,
            actor: actor.clone(),
            timestamp: Timestamp::now(),
        });
        self.state = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn account(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn request() -> IssuanceRequest {
        IssuanceRequest::new(CompanyId::new(), CompanyName::new("TestCompany").unwrap())
    }

    fn mint(r: &mut IssuanceRequest, policy: MintPolicy) -> Result<(), IssuanceError> {
        r.check_mint(policy)?;
        r.commit_mint(&account("issuer"));
        Ok(())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    #[test]
    fn new_request_is_requested() {
        let r = request();
        assert_eq!(r.state, IssuanceState::Requested);
        assert!(r.cleared_by.is_none());
        assert!(r.transitions.is_empty());
    }

    #[test]
    fn mint_before_clearance_is_not_cleared() {
        let mut r = request();
        let err = mint(&mut r, MintPolicy::TopUp).unwrap_err();
        assert!(matches!(err, IssuanceError::NotCleared { .. }));
        assert_eq!(r.state, IssuanceState::Requested);
        assert_eq!(r.mint_count, 0);
    }

    #[test]
    fn clear_then_mint() {
        let mut r = request();
        r.clear(&account("advocate")).unwrap();
        assert_eq!(r.state, IssuanceState::Cleared);
        assert_eq!(r.cleared_by, Some(account("advocate")));

        mint(&mut r, MintPolicy::TopUp).unwrap();
        assert_eq!(r.state, IssuanceState::Minted);
        assert_eq!(r.mint_count, 1);
        assert_eq!(r.transitions.len(), 2);
        assert_eq!(r.transitions[1].actor, account("issuer"));
    }

    #[test]
    fn clearing_twice_fails() {
        let mut r = request();
        r.clear(&account("advocate")).unwrap();
        let err = r.clear(&account("advocate")).unwrap_err();
        assert!(matches!(
            err,
            IssuanceError::NotPending {
                state: IssuanceState::Cleared,
                ..
            }
        ));
    }

    // ── Mint policy ──────────────────────────────────────────────────

    #[test]
    fn top_up_allows_repeated_mints() {
        let mut r = request();
        r.clear(&account("advocate")).unwrap();
        for _ in 0..3 {
            mint(&mut r, MintPolicy::TopUp).unwrap();
        }
        assert_eq!(r.mint_count, 3);
        assert_eq!(r.state, IssuanceState::Minted);
    }

    #[test]
    fn single_issue_rejects_second_mint() {
        let mut r = request();
        r.clear(&account("advocate")).unwrap();
        mint(&mut r, MintPolicy::SingleIssue).unwrap();
        let err = r.check_mint(MintPolicy::SingleIssue).unwrap_err();
        assert!(matches!(err, IssuanceError::AlreadyMinted { .. }));
        assert_eq!(r.mint_count, 1);
    }

    #[test]
    fn mint_policy_parsing() {
        assert_eq!("top-up".parse::<MintPolicy>().unwrap(), MintPolicy::TopUp);
        assert_eq!(
            "Single-Issue".parse::<MintPolicy>().unwrap(),
            MintPolicy::SingleIssue
        );
        assert!("sometimes".parse::<MintPolicy>().is_err());
        assert_eq!(MintPolicy::default(), MintPolicy::TopUp);
    }

    // ── Display / serialization ──────────────────────────────────────

    #[test]
    fn state_display() {
        assert_eq!(IssuanceState::Requested.to_string(), "REQUESTED");
        assert_eq!(IssuanceState::Cleared.to_string(), "CLEARED");
        assert_eq!(IssuanceState::Minted.to_string(), "MINTED");
    }

    #[test]
    fn mint_policy_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&MintPolicy::SingleIssue).unwrap(),
            "\"single-issue\""
        );
    }

    #[test]
    fn request_serialization() {
        let mut r = request();
        r.clear(&account("advocate")).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        let parsed: IssuanceRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state, IssuanceState::Cleared);
        assert_eq!(parsed.name, r.name);
    }
}
