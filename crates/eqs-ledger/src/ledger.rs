//! # Ledger
//!
//! Balances, total supply, and the shareholder registry of one company.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eqs_core::{AccountId, Amount, BalanceSource, CompanyId, Granularity};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by ledger mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is not a multiple of the company's granularity.
    #[error("amount {amount} is not a multiple of granularity {granularity}")]
    GranularityViolation {
        /// The rejected amount.
        amount: Amount,
        /// The company's granularity.
        granularity: Granularity,
    },

    /// Sender does not hold enough shares.
    #[error("account {account} holds {balance}, cannot move {requested}")]
    InsufficientBalance {
        /// The sending account.
        account: AccountId,
        /// Its current balance.
        balance: Amount,
        /// The requested amount.
        requested: Amount,
    },

    /// Recipient is the reserved zero account.
    #[error("recipient {account} is not a valid holder")]
    InvalidRecipient {
        /// The rejected recipient.
        account: AccountId,
    },

    /// Minting would overflow the supply counter.
    #[error("minting {amount} would overflow total supply {total_supply}")]
    SupplyOverflow {
        /// The requested mint amount.
        amount: Amount,
        /// Supply before the mint.
        total_supply: Amount,
    },

    /// The sum of balances no longer matches the total supply.
    #[error("supply invariant broken: total supply {total_supply}, sum of balances {sum}")]
    SupplyMismatch {
        /// The recorded total supply.
        total_supply: Amount,
        /// The actual sum of all balances.
        sum: Amount,
    },

    /// A restored registry lists the same account twice.
    #[error("account {account} appears more than once in the shareholder registry")]
    DuplicateHolder {
        /// The repeated account.
        account: AccountId,
    },
}

// ─── Receipts ────────────────────────────────────────────────────────

/// An account that entered the shareholder registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHolder {
    /// The account that was appended.
    pub account: AccountId,
    /// Registry length after the append.
    pub holder_count: usize,
}

/// Outcome of a successful mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Account credited with the new shares.
    pub to: AccountId,
    /// Amount minted.
    pub amount: Amount,
    /// Total supply after the mint.
    pub total_supply: Amount,
    /// Set when the recipient entered the registry.
    pub new_holder: Option<NewHolder>,
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// Balance sheet and shareholder registry of a single company.
///
/// Deserialization rebuilds the registry index and rejects a record whose
/// registry repeats an account or whose balances do not sum to the supply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "LedgerRecord")]
pub struct Ledger {
    company: CompanyId,
    granularity: Granularity,
    balances: BTreeMap<AccountId, Amount>,
    total_supply: Amount,
    registry: Vec<AccountId>,
    #[serde(skip_serializing)]
    registered: BTreeSet<AccountId>,
}

/// Serialized form of [`Ledger`], without the derived index.
#[derive(Deserialize)]
struct LedgerRecord {
    company: CompanyId,
    granularity: Granularity,
    balances: BTreeMap<AccountId, Amount>,
    total_supply: Amount,
    registry: Vec<AccountId>,
}

impl TryFrom<LedgerRecord> for Ledger {
    type Error = LedgerError;

    fn try_from(record: LedgerRecord) -> Result<Self, Self::Error> {
        let mut registered = BTreeSet::new();
        for account in &record.registry {
            if !registered.insert(account.clone()) {
                return Err(LedgerError::DuplicateHolder {
                    account: account.clone(),
                });
            }
        }
        let ledger = Self {
            company: record.company,
            granularity: record.granularity,
            balances: record.balances,
            total_supply: record.total_supply,
            registry: record.registry,
            registered,
        };
        ledger.verify_supply()?;
        Ok(ledger)
    }
}

impl Ledger {
    /// Create an empty ledger for `company`.
    pub fn new(company: CompanyId, granularity: Granularity) -> Self {
        Self {
            company,
            granularity,
            balances: BTreeMap::new(),
            total_supply: 0,
            registry: Vec::new(),
            registered: BTreeSet::new(),
        }
    }

    /// The company this ledger belongs to.
    pub fn company(&self) -> CompanyId {
        self.company
    }

    /// The company's granularity.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Total shares in existence.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of `account`. Accounts never seen hold zero.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// The shareholder registry in entry order.
    pub fn registry(&self) -> &[AccountId] {
        &self.registry
    }

    /// Owned copy of the shareholder registry.
    pub fn registry_snapshot(&self) -> Vec<AccountId> {
        self.registry.clone()
    }

    /// Number of accounts that have ever held shares.
    pub fn holder_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether `account` has ever held shares.
    pub fn is_holder(&self, account: &AccountId) -> bool {
        self.registered.contains(account)
    }

    /// Accounts with a currently positive balance, in account order.
    pub fn balances(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.balances.iter().map(|(a, b)| (a, *b))
    }

    /// Credit `to` with `amount` newly created shares.
    pub fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<MintReceipt, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient { account: to.clone() });
        }
        self.require_granular(amount)?;
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow {
                amount,
                total_supply: self.total_supply,
            })?;
        // Cannot overflow: every balance is bounded by the total supply.
        let balance = self.balance_of(to) + amount;

        self.commit(total_supply, &[(to, balance)])?;
        let new_holder = self.record_holder(to);

        Ok(MintReceipt {
            to: to.clone(),
            amount,
            total_supply,
            new_holder,
        })
    }

    /// Recompute the sum of balances and compare it with the total supply.
    pub fn verify_supply(&self) -> Result<(), LedgerError> {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, b| acc.checked_add(*b));
        match sum {
            Some(sum) if sum == self.total_supply => Ok(()),
            Some(sum) => Err(LedgerError::SupplyMismatch {
                total_supply: self.total_supply,
                sum,
            }),
            None => Err(LedgerError::SupplyMismatch {
                total_supply: self.total_supply,
                sum: u128::MAX,
            }),
        }
    }

    pub(crate) fn require_granular(&self, amount: Amount) -> Result<(), LedgerError> {
        if self.granularity.divides(amount) {
            Ok(())
        } else {
            Err(LedgerError::GranularityViolation {
                amount,
                granularity: self.granularity,
            })
        }
    }

    /// Write a computed post-state, then confirm the supply invariant. On a
    /// mismatch every write is undone before the error is returned.
    pub(crate) fn commit(
        &mut self,
        total_supply: Amount,
        writes: &[(&AccountId, Amount)],
    ) -> Result<(), LedgerError> {
        let prior_supply = self.total_supply;
        let prior: Vec<(AccountId, Amount)> = writes
            .iter()
            .map(|(account, _)| (AccountId::clone(account), self.balance_of(account)))
            .collect();

        self.total_supply = total_supply;
        for (account, balance) in writes {
            self.set_balance(account, *balance);
        }
        if let Err(e) = self.verify_supply() {
            self.total_supply = prior_supply;
            for (account, balance) in prior.iter().rev() {
                self.set_balance(account, *balance);
            }
            return Err(e);
        }
        Ok(())
    }

    fn set_balance(&mut self, account: &AccountId, balance: Amount) {
        if balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), balance);
        }
    }

    /// Append `account` to the registry if it now holds shares and is not
    /// already listed. Idempotent.
    pub(crate) fn record_holder(&mut self, account: &AccountId) -> Option<NewHolder> {
        if self.balance_of(account) == 0 || self.registered.contains(account) {
            return None;
        }
        self.registered.insert(account.clone());
        self.registry.push(account.clone());
        Some(NewHolder {
            account: account.clone(),
            holder_count: self.registry.len(),
        })
    }
}

impl BalanceSource for Ledger {
    fn balance_of(&self, account: &AccountId) -> Amount {
        Ledger::balance_of(self, account)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
