use chrono::{DateTime, Utc};

use crate::domain::{
    Account, Cents, IntegrityReport, Ledger, LedgerError, Transaction, build_integrity_report,
};

/// Application service providing high-level operations for the bank.
/// This is the primary interface for any client (the interactive menu,
/// exports, tests). One instance owns one ledger for the process lifetime;
/// tests construct their own isolated instances.
pub struct BankService {
    ledger: Ledger,
}

/// One row of an account listing: a snapshot, detached from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub account_id: String,
    pub owner: String,
    pub balance_cents: Cents,
}

/// Result of a deposit or withdrawal.
#[derive(Debug)]
pub struct MutationReceipt {
    pub transaction: Transaction,
    pub balance_cents: Cents,
}

/// Result of a transfer: both recorded legs plus both sides' state after.
#[derive(Debug)]
pub struct TransferReceipt {
    pub amount_cents: Cents,
    pub debit: Transaction,
    pub credit: Transaction,
    pub source: AccountSummary,
    pub destination: AccountSummary,
}

/// Detailed account information, for display.
pub struct AccountInfo {
    pub summary: AccountSummary,
    pub opening_balance_cents: Cents,
    pub transaction_count: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

fn summarize(account: &Account) -> AccountSummary {
    AccountSummary {
        account_id: account.account_id().to_string(),
        owner: account.owner().to_string(),
        balance_cents: account.balance_cents(),
    }
}

impl BankService {
    pub fn new() -> Self {
        Self {
            ledger: Ledger::new(),
        }
    }

    /// Open an account. The opening balance is passed through as typed by
    /// the user; the ledger validates it.
    pub fn create_account(
        &mut self,
        account_id: &str,
        owner: &str,
        opening_balance: &str,
    ) -> Result<AccountSummary, LedgerError> {
        let account = self
            .ledger
            .create_account(account_id, owner, opening_balance)?;
        Ok(summarize(account))
    }

    pub fn deposit(
        &mut self,
        account_id: &str,
        amount_cents: Cents,
    ) -> Result<MutationReceipt, LedgerError> {
        let account = self
            .ledger
            .get_mut(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        let transaction = account.deposit(amount_cents)?.clone();
        Ok(MutationReceipt {
            transaction,
            balance_cents: account.balance_cents(),
        })
    }

    pub fn withdraw(
        &mut self,
        account_id: &str,
        amount_cents: Cents,
    ) -> Result<MutationReceipt, LedgerError> {
        let account = self
            .ledger
            .get_mut(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        let transaction = account.withdraw(amount_cents)?.clone();
        Ok(MutationReceipt {
            transaction,
            balance_cents: account.balance_cents(),
        })
    }

    pub fn transfer(
        &mut self,
        source_id: &str,
        amount_cents: Cents,
        destination_id: &str,
    ) -> Result<TransferReceipt, LedgerError> {
        let record = self.ledger.transfer(source_id, amount_cents, destination_id)?;
        let source = self.account_summary(source_id)?;
        let destination = self.account_summary(destination_id)?;
        Ok(TransferReceipt {
            amount_cents,
            debit: record.debit,
            credit: record.credit,
            source,
            destination,
        })
    }

    /// Look up an account. Absence is a normal outcome the caller handles.
    pub fn get_account(&self, account_id: &str) -> Option<&Account> {
        self.ledger.get(account_id)
    }

    /// Transactions of one account in chronological order.
    pub fn history(
        &self,
        account_id: &str,
    ) -> Result<impl Iterator<Item = &Transaction>, LedgerError> {
        let account = self
            .ledger
            .get(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        Ok(account.history())
    }

    pub fn account_info(&self, account_id: &str) -> Result<AccountInfo, LedgerError> {
        let account = self
            .ledger
            .get(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        Ok(AccountInfo {
            summary: summarize(account),
            opening_balance_cents: account.opening_balance_cents(),
            transaction_count: account.transaction_count(),
            last_activity: account.last_activity(),
        })
    }

    /// Snapshot of all accounts in creation order.
    pub fn list_accounts(&self) -> Vec<AccountSummary> {
        self.ledger.iter().map(summarize).collect()
    }

    /// Accounts in creation order, borrowed (used by the exporters).
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.ledger.iter()
    }

    pub fn total_balance_cents(&self) -> Cents {
        self.ledger.total_balance_cents()
    }

    pub fn check_integrity(&self) -> IntegrityReport {
        build_integrity_report(&self.ledger)
    }

    fn account_summary(&self, account_id: &str) -> Result<AccountSummary, LedgerError> {
        self.ledger
            .get(account_id)
            .map(summarize)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }
}

impl Default for BankService {
    fn default() -> Self {
        Self::new()
    }
}
