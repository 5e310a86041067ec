//! # Balance Lookup Seam
//!
//! Vote weighting needs to read holder balances without owning the ledger.
//! `BalanceSource` is that seam: the ledger implements it, and tests can use
//! a plain map.

use std::collections::{BTreeMap, HashMap};

use crate::amount::Amount;
use crate::identity::AccountId;

/// Read-only access to share balances.
pub trait BalanceSource {
    /// Current balance of `account`. Unknown accounts hold zero.
    fn balance_of(&self, account: &AccountId) -> Amount;
}

impl BalanceSource for HashMap<AccountId, Amount> {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.get(account).copied().unwrap_or(0)
    }
}

impl BalanceSource for BTreeMap<AccountId, Amount> {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.get(account).copied().unwrap_or(0)
    }
}

impl<T: BalanceSource + ?Sized> BalanceSource for &T {
    fn balance_of(&self, account: &AccountId) -> Amount {
        (**self).balance_of(account)
    }
}
