use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Cents, LedgerError, Transaction, TransactionKind};

/// A named holder of a balance and its transaction history.
///
/// The balance is a derived cache: it always equals the opening balance plus
/// the signed sum of the history. Fields are private so the only way to move
/// money is through the operations below, which keep that invariant and
/// never let the balance go negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    account_id: String,
    owner: String,
    opening_balance_cents: Cents,
    balance_cents: Cents,
    history: Vec<Transaction>,
}

impl Account {
    /// Create an account with an empty history. The opening balance must
    /// already be validated (the ledger rejects negative ones).
    pub fn new(account_id: impl Into<String>, owner: impl Into<String>, opening_balance_cents: Cents) -> Self {
        debug_assert!(opening_balance_cents >= 0);
        Self {
            account_id: account_id.into(),
            owner: owner.into(),
            opening_balance_cents,
            balance_cents: opening_balance_cents,
            history: Vec::new(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn balance_cents(&self) -> Cents {
        self.balance_cents
    }

    pub fn opening_balance_cents(&self) -> Cents {
        self.opening_balance_cents
    }

    /// Transactions in chronological (insertion) order. The iterator borrows
    /// the log; it never mutates it and can be restarted at will.
    pub fn history(&self) -> impl Iterator<Item = &Transaction> {
        self.history.iter()
    }

    pub fn transaction_count(&self) -> usize {
        self.history.len()
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.history.last().map(|tx| tx.timestamp)
    }

    /// Signed sum of all history entries (credits positive, debits negative).
    pub fn signed_history_total(&self) -> Cents {
        self.history.iter().map(Transaction::signed_amount).sum()
    }

    /// True when the cached balance matches the recomputed one.
    pub fn is_consistent(&self) -> bool {
        self.balance_cents == self.opening_balance_cents + self.signed_history_total()
    }

    /// Credit the account. Fails with `InvalidAmount` for non-positive
    /// amounts; once the amount is valid there is no failure path.
    pub fn deposit(&mut self, amount_cents: Cents) -> Result<&Transaction, LedgerError> {
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(self.record(Transaction::new(TransactionKind::Deposit, amount_cents)))
    }

    /// Debit the account. Fails with `InvalidAmount` or `InsufficientFunds`,
    /// leaving balance and history untouched.
    pub fn withdraw(&mut self, amount_cents: Cents) -> Result<&Transaction, LedgerError> {
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if amount_cents > self.balance_cents {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance_cents,
                requested: amount_cents,
            });
        }
        Ok(self.record(Transaction::new(TransactionKind::Withdrawal, amount_cents)))
    }

    /// Outgoing leg of a transfer. Same preconditions as `withdraw`; the
    /// ledger calls this only after the destination has been resolved.
    pub(crate) fn record_transfer_out(
        &mut self,
        amount_cents: Cents,
        counterparty: &str,
    ) -> Result<&Transaction, LedgerError> {
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if amount_cents > self.balance_cents {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance_cents,
                requested: amount_cents,
            });
        }
        Ok(self.record(
            Transaction::new(TransactionKind::TransferOut, amount_cents)
                .with_counterparty(counterparty),
        ))
    }

    /// Incoming leg of a transfer. Infallible: the amount was validated when
    /// the outgoing leg was recorded, so the pair succeeds or fails together.
    pub(crate) fn record_transfer_in(
        &mut self,
        amount_cents: Cents,
        counterparty: &str,
    ) -> &Transaction {
        self.record(
            Transaction::new(TransactionKind::TransferIn, amount_cents)
                .with_counterparty(counterparty),
        )
    }

    fn record(&mut self, transaction: Transaction) -> &Transaction {
        self.balance_cents += transaction.signed_amount();
        self.history.push(transaction);
        // Appending is the only mutation, so the cache stays in lockstep
        debug_assert!(self.is_consistent());
        &self.history[self.history.len() - 1]
    }
}
