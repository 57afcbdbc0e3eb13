use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type TransactionId = Uuid;

/// The kind of ledger event a transaction records. Deposits and incoming
/// transfers credit an account, withdrawals and outgoing transfers debit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::TransferOut => "transfer_out",
            TransactionKind::TransferIn => "transfer_in",
        }
    }

    /// Returns true if this kind increases the account balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionKind::Deposit | TransactionKind::TransferIn)
    }

    /// +1 for credits, -1 for debits. Used to fold a history into a balance.
    pub fn sign(&self) -> Cents {
        if self.is_credit() { 1 } else { -1 }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable record of one balance-changing event. Owned exclusively by
/// the account whose history it belongs to; never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    /// Amount in cents (always positive; the kind carries the sign)
    pub amount_cents: Cents,
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// Owner name of the other account, for transfer kinds
    pub counterparty: Option<String>,
}

impl Transaction {
    /// Create a new transaction stamped with the current time.
    pub fn new(kind: TransactionKind, amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            kind,
            amount_cents,
            timestamp: Utc::now(),
            counterparty: None,
        }
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }

    /// The amount with the kind's sign applied: positive for credits,
    /// negative for debits.
    pub fn signed_amount(&self) -> Cents {
        self.kind.sign() * self.amount_cents
    }

    pub fn is_transfer(&self) -> bool {
        matches!(
            self.kind,
            TransactionKind::TransferOut | TransactionKind::TransferIn
        )
    }
}
