//! # Transfer Processor
//!
//! Tranche-tagged movement of shares between holders.
//!
//! A transfer debits the sender, credits the recipient and appends the
//! recipient to the shareholder registry, as one step. The tranche is opaque
//! metadata carried through to the receipt; it is not validated against any
//! schedule and does not partition balances.

use serde::{Deserialize, Serialize};

use eqs_core::{AccountId, Amount, TrancheId};

use crate::ledger::{Ledger, LedgerError, NewHolder};

/// A requested transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Classification tag for downstream compliance.
    pub tranche: TrancheId,
    /// Debited account.
    pub from: AccountId,
    /// Credited account.
    pub to: AccountId,
    /// Number of shares to move.
    pub amount: Amount,
    /// Free-form data attached by the sender.
    #[serde(default)]
    pub metadata: Vec<u8>,
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Tranche the transfer was tagged with.
    pub tranche: TrancheId,
    /// Debited account.
    pub from: AccountId,
    /// Credited account.
    pub to: AccountId,
    /// Number of shares moved.
    pub amount: Amount,
    /// Sender balance after the transfer.
    pub from_balance: Amount,
    /// Recipient balance after the transfer.
    pub to_balance: Amount,
    /// Set when the recipient entered the registry.
    pub new_holder: Option<NewHolder>,
}

impl Ledger {
    /// Move `request.amount` shares from `request.from` to `request.to`.
    ///
    /// Checks, in order: recipient is not the zero account, the amount is a
    /// multiple of the granularity, and the sender holds enough. Nothing is
    /// written unless all three pass.
    pub fn send(&mut self, request: &TransferRequest) -> Result<TransferReceipt, LedgerError> {
        let TransferRequest {
            tranche,
            from,
            to,
            amount,
            ..
        } = request;
        let amount = *amount;

        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient { account: to.clone() });
        }
        self.require_granular(amount)?;

        let from_before = self.balance_of(from);
        if from_before < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.clone(),
                balance: from_before,
                requested: amount,
            });
        }

        let (from_after, to_after) = if from == to {
            (from_before, from_before)
        } else {
            // Cannot overflow: both balances are bounded by the total supply.
            (from_before - amount, self.balance_of(to) + amount)
        };

        self.commit(self.total_supply(), &[(from, from_after), (to, to_after)])?;
        let new_holder = self.record_holder(to);

        Ok(TransferReceipt {
            tranche: *tranche,
            from: from.clone(),
            to: to.clone(),
            amount,
            from_balance: from_after,
            to_balance: to_after,
            new_holder,
        })
    }
}
