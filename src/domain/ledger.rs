use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use super::{Account, Cents, Transaction, format_cents, parse_cents};

/// Everything that can go wrong with a ledger operation. All of these are
/// recoverable input-validation failures: the failing call leaves every
/// account exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid account id '{0}': account ids must be non-empty and contain only digits")]
    InvalidAccountId(String),

    #[error("account {0} already exists")]
    DuplicateAccountId(String),

    #[error("amount must be a positive number")]
    InvalidAmount,

    #[error("opening balance cannot be negative (got {})", format_cents(*.0))]
    NegativeBalance(Cents),

    #[error(
        "insufficient funds: balance {}, requested {}",
        format_cents(*.balance),
        format_cents(*.requested)
    )]
    InsufficientFunds { balance: Cents, requested: Cents },

    #[error("account {0} does not exist")]
    AccountNotFound(String),

    #[error("cannot transfer from account {0} to itself")]
    SelfTransfer(String),
}

/// Returns true if `id` is acceptable as an account id: non-empty, digits only.
pub fn is_valid_account_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// The collection of all accounts and the authority for cross-account
/// operations. Accounts are keyed by id; creation order is preserved for
/// listing. Accounts are never removed during a run.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<String, Account>,
    /// Account ids in creation order
    order: Vec<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.accounts.contains_key(account_id)
    }

    /// Look up an account. Absence is a normal outcome, not an error.
    pub fn get(&self, account_id: &str) -> Option<&Account> {
        self.accounts.get(account_id)
    }

    pub fn get_mut(&mut self, account_id: &str) -> Option<&mut Account> {
        self.accounts.get_mut(account_id)
    }

    /// Accounts in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.order.iter().filter_map(|id| self.accounts.get(id))
    }

    /// Sum of all account balances. Invariant under transfers.
    pub fn total_balance_cents(&self) -> Cents {
        self.iter().map(Account::balance_cents).sum()
    }

    /// Open a new account. The opening balance arrives as the raw user input
    /// and is validated here, after the id checks: non-numeric input fails
    /// `InvalidAmount`, a negative number fails `NegativeBalance`.
    pub fn create_account(
        &mut self,
        account_id: &str,
        owner: &str,
        opening_balance: &str,
    ) -> Result<&Account, LedgerError> {
        if !is_valid_account_id(account_id) {
            return Err(LedgerError::InvalidAccountId(account_id.to_string()));
        }
        if self.accounts.contains_key(account_id) {
            return Err(LedgerError::DuplicateAccountId(account_id.to_string()));
        }
        let opening_cents =
            parse_cents(opening_balance).map_err(|_| LedgerError::InvalidAmount)?;
        if opening_cents < 0 {
            return Err(LedgerError::NegativeBalance(opening_cents));
        }

        let account = Account::new(account_id, owner, opening_cents);
        self.order.push(account_id.to_string());
        self.accounts.insert(account_id.to_string(), account);
        Ok(&self.accounts[account_id])
    }

    /// Move money between two accounts as one atomic unit: a `TransferOut`
    /// entry on the source and a `TransferIn` entry on the destination, both
    /// for the same amount.
    ///
    /// Every precondition is checked before the first mutation, so a failure
    /// (missing account, self transfer, bad amount, insufficient funds)
    /// leaves both accounts byte-for-byte unchanged, and once the debit has
    /// landed the credit cannot fail.
    pub fn transfer(
        &mut self,
        source_id: &str,
        amount_cents: Cents,
        destination_id: &str,
    ) -> Result<TransferRecord, LedgerError> {
        let source_owner = self
            .accounts
            .get(source_id)
            .map(|a| a.owner().to_string())
            .ok_or_else(|| LedgerError::AccountNotFound(source_id.to_string()))?;
        let destination_owner = self
            .accounts
            .get(destination_id)
            .map(|a| a.owner().to_string())
            .ok_or_else(|| LedgerError::AccountNotFound(destination_id.to_string()))?;
        if source_id == destination_id {
            return Err(LedgerError::SelfTransfer(source_id.to_string()));
        }

        // Debit first: record_transfer_out validates the amount and the
        // funds, and mutates nothing on failure.
        let debit = self
            .accounts
            .get_mut(source_id)
            .ok_or_else(|| LedgerError::AccountNotFound(source_id.to_string()))?
            .record_transfer_out(amount_cents, &destination_owner)?
            .clone();

        let credit = self
            .accounts
            .get_mut(destination_id)
            .ok_or_else(|| LedgerError::AccountNotFound(destination_id.to_string()))?
            .record_transfer_in(amount_cents, &source_owner)
            .clone();

        Ok(TransferRecord { debit, credit })
    }
}

/// The pair of entries a successful transfer appends: the debit on the
/// source and the credit on the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub debit: Transaction,
    pub credit: Transaction,
}

/// Snapshot of the ledger's internal consistency, in the spirit of a
/// double-entry check: the cached balances must match the recomputed ones
/// and every map key must match its account's id.
#[derive(Debug, Serialize)]
pub struct IntegrityReport {
    pub account_count: usize,
    pub transaction_count: usize,
    pub total_balance_cents: Cents,
    /// Ids of accounts whose cached balance disagrees with their history
    pub balance_mismatches: Vec<String>,
    /// Map keys that don't match the stored account's id
    pub key_mismatches: Vec<String>,
    /// Ids of accounts with a negative balance
    pub negative_balances: Vec<String>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.balance_mismatches.is_empty()
            && self.key_mismatches.is_empty()
            && self.negative_balances.is_empty()
    }
}

pub fn build_integrity_report(ledger: &Ledger) -> IntegrityReport {
    let mut report = IntegrityReport {
        account_count: ledger.len(),
        transaction_count: 0,
        total_balance_cents: ledger.total_balance_cents(),
        balance_mismatches: Vec::new(),
        key_mismatches: Vec::new(),
        negative_balances: Vec::new(),
    };

    for account in ledger.iter() {
        report.transaction_count += account.transaction_count();
        if !account.is_consistent() {
            report.balance_mismatches.push(account.account_id().to_string());
        }
        if account.balance_cents() < 0 {
            report.negative_balances.push(account.account_id().to_string());
        }
    }
    for (key, account) in &ledger.accounts {
        if key != account.account_id() {
            report.key_mismatches.push(key.clone());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_two_accounts() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.create_account("100", "Alice", "50.00").unwrap();
        ledger.create_account("200", "Bob", "0").unwrap();
        ledger
    }

    #[test]
    fn test_create_account() {
        let mut ledger = Ledger::new();
        let account = ledger.create_account("100", "Alice", "50").unwrap();

        assert_eq!(account.account_id(), "100");
        assert_eq!(account.owner(), "Alice");
        assert_eq!(account.balance_cents(), 5000);
        assert_eq!(account.transaction_count(), 0);
    }

    #[test]
    fn test_create_account_rejects_bad_ids() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.create_account("12a", "Alice", "0"),
            Err(LedgerError::InvalidAccountId("12a".to_string()))
        );
        assert_eq!(
            ledger.create_account("", "Alice", "0"),
            Err(LedgerError::InvalidAccountId(String::new()))
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_create_account_rejects_duplicates() {
        let mut ledger = ledger_with_two_accounts();
        assert_eq!(
            ledger.create_account("100", "Mallory", "0"),
            Err(LedgerError::DuplicateAccountId("100".to_string()))
        );
        // Original account untouched
        assert_eq!(ledger.get("100").map(Account::owner), Some("Alice"));
    }

    #[test]
    fn test_create_account_validates_opening_balance() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.create_account("100", "Alice", "lots"),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            ledger.create_account("100", "Alice", "-10"),
            Err(LedgerError::NegativeBalance(-1000))
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_id_checks_come_before_balance_checks() {
        let mut ledger = Ledger::new();
        // Both the id and the balance are bad; the id error wins
        assert_eq!(
            ledger.create_account("abc", "Alice", "-10"),
            Err(LedgerError::InvalidAccountId("abc".to_string()))
        );
    }

    #[test]
    fn test_get_returns_none_for_unknown_account() {
        let ledger = ledger_with_two_accounts();
        assert!(ledger.get("999").is_none());
        assert!(ledger.get("100").is_some());
    }

    #[test]
    fn test_iter_preserves_creation_order() {
        let mut ledger = Ledger::new();
        for id in ["3", "1", "2"] {
            ledger.create_account(id, "Owner", "0").unwrap();
        }
        let ids: Vec<_> = ledger.iter().map(Account::account_id).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_transfer_moves_money_and_records_both_legs() {
        let mut ledger = ledger_with_two_accounts();
        ledger.transfer("100", 3000, "200").unwrap();

        let alice = ledger.get("100").unwrap();
        let bob = ledger.get("200").unwrap();
        assert_eq!(alice.balance_cents(), 2000);
        assert_eq!(bob.balance_cents(), 3000);

        let out = alice.history().next().unwrap();
        assert_eq!(out.kind, crate::domain::TransactionKind::TransferOut);
        assert_eq!(out.amount_cents, 3000);
        assert_eq!(out.counterparty.as_deref(), Some("Bob"));

        let inc = bob.history().next().unwrap();
        assert_eq!(inc.kind, crate::domain::TransactionKind::TransferIn);
        assert_eq!(inc.amount_cents, 3000);
        assert_eq!(inc.counterparty.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_transfer_conserves_total_balance() {
        let mut ledger = ledger_with_two_accounts();
        let before = ledger.total_balance_cents();

        ledger.transfer("100", 1000, "200").unwrap();
        ledger.transfer("200", 500, "100").unwrap();
        ledger.transfer("100", 4500, "200").unwrap();

        assert_eq!(ledger.total_balance_cents(), before);
    }

    #[test]
    fn test_transfer_insufficient_funds_mutates_neither_side() {
        let mut ledger = ledger_with_two_accounts();
        let err = ledger.transfer("100", 9000, "200").unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                balance: 5000,
                requested: 9000,
            }
        );
        assert_eq!(ledger.get("100").unwrap().balance_cents(), 5000);
        assert_eq!(ledger.get("100").unwrap().transaction_count(), 0);
        assert_eq!(ledger.get("200").unwrap().balance_cents(), 0);
        assert_eq!(ledger.get("200").unwrap().transaction_count(), 0);
    }

    #[test]
    fn test_transfer_requires_both_accounts() {
        let mut ledger = ledger_with_two_accounts();
        assert_eq!(
            ledger.transfer("999", 100, "200"),
            Err(LedgerError::AccountNotFound("999".to_string()))
        );
        // Destination existence is enforced here, not left to the caller
        assert_eq!(
            ledger.transfer("100", 100, "999"),
            Err(LedgerError::AccountNotFound("999".to_string()))
        );
        assert_eq!(ledger.get("100").unwrap().transaction_count(), 0);
    }

    #[test]
    fn test_transfer_to_self_is_rejected() {
        let mut ledger = ledger_with_two_accounts();
        assert_eq!(
            ledger.transfer("100", 100, "100"),
            Err(LedgerError::SelfTransfer("100".to_string()))
        );
        assert_eq!(ledger.get("100").unwrap().transaction_count(), 0);
    }

    #[test]
    fn test_transfer_rejects_non_positive_amounts() {
        let mut ledger = ledger_with_two_accounts();
        assert_eq!(ledger.transfer("100", 0, "200"), Err(LedgerError::InvalidAmount));
        assert_eq!(
            ledger.transfer("100", -500, "200"),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(ledger.get("100").unwrap().balance_cents(), 5000);
    }

    #[test]
    fn test_integrity_report_on_healthy_ledger() {
        let mut ledger = ledger_with_two_accounts();
        ledger.transfer("100", 1500, "200").unwrap();
        ledger.get_mut("200").unwrap().deposit(100).unwrap();

        let report = build_integrity_report(&ledger);
        assert!(report.is_ok());
        assert_eq!(report.account_count, 2);
        assert_eq!(report.transaction_count, 3);
        assert_eq!(report.total_balance_cents, 5100);
    }

    #[test]
    fn test_is_valid_account_id() {
        assert!(is_valid_account_id("0"));
        assert!(is_valid_account_id("123456"));
        assert!(!is_valid_account_id(""));
        assert!(!is_valid_account_id("12a"));
        assert!(!is_valid_account_id(" 123"));
        assert!(!is_valid_account_id("12.3"));
    }
}
