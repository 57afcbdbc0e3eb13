mod common;

use anyhow::Result;
use common::{StandardAccounts, test_service};
use kasa::domain::{LedgerError, TransactionKind};

#[test]
fn test_deposit_appends_to_history() -> Result<()> {
    let mut service = test_service();
    StandardAccounts::create_basic(&mut service)?;

    let receipt = service.deposit("100", 2500)?;
    assert_eq!(receipt.balance_cents, 7500);

    let history: Vec<_> = service.history("100")?.cloned().collect();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::Deposit);
    assert_eq!(history[0].amount_cents, 2500);
    assert!(history[0].counterparty.is_none());

    Ok(())
}

#[test]
fn test_failed_withdrawal_appends_nothing() -> Result<()> {
    let mut service = test_service();
    StandardAccounts::create_basic(&mut service)?;
    service.deposit("100", 2500)?;

    let err = service.withdraw("100", 10000).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    assert_eq!(service.account_info("100")?.summary.balance_cents, 7500);
    assert_eq!(service.history("100")?.count(), 1);

    Ok(())
}

#[test]
fn test_history_is_chronological() -> Result<()> {
    let mut service = test_service();
    StandardAccounts::create_basic(&mut service)?;

    service.deposit("100", 1000)?;
    service.withdraw("100", 500)?;
    service.transfer("100", 250, "200")?;

    let kinds: Vec<_> = service.history("100")?.map(|tx| tx.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::Deposit,
            TransactionKind::Withdrawal,
            TransactionKind::TransferOut,
        ]
    );

    // Timestamps never decrease along the log
    let timestamps: Vec<_> = service.history("100")?.map(|tx| tx.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));

    Ok(())
}

#[test]
fn test_history_iterator_is_restartable_and_read_only() -> Result<()> {
    let mut service = test_service();
    StandardAccounts::create_basic(&mut service)?;
    service.deposit("100", 1000)?;
    service.deposit("100", 2000)?;

    let first: Vec<_> = service.history("100")?.cloned().collect();
    let second: Vec<_> = service.history("100")?.cloned().collect();
    assert_eq!(first, second);
    assert_eq!(service.account_info("100")?.transaction_count, 2);

    Ok(())
}

#[test]
fn test_history_of_unknown_account_fails() {
    let service = test_service();
    let err = service.history("999").map(|_| ()).unwrap_err();
    assert_eq!(err, LedgerError::AccountNotFound("999".to_string()));
}

#[test]
fn test_balance_always_matches_signed_history() -> Result<()> {
    let mut service = test_service();
    StandardAccounts::create_trio(&mut service)?;

    service.deposit("100", 12345)?;
    service.withdraw("100", 45)?;
    service.transfer("100", 300, "200")?;
    service.transfer("300", 10000, "100")?;
    service.withdraw("300", 1)?;

    for account in ["100", "200", "300"] {
        let info = service.account_info(account)?;
        let signed: i64 = service.history(account)?.map(|tx| tx.signed_amount()).sum();
        assert_eq!(
            info.summary.balance_cents,
            info.opening_balance_cents + signed,
            "account {account} diverged from its log"
        );
    }
    assert!(service.check_integrity().is_ok());

    Ok(())
}

#[test]
fn test_integrity_report_counts() -> Result<()> {
    let mut service = test_service();
    StandardAccounts::create_basic(&mut service)?;
    service.deposit("100", 100)?;
    service.transfer("100", 50, "200")?;

    let report = service.check_integrity();
    assert!(report.is_ok());
    assert_eq!(report.account_count, 2);
    // deposit + transfer_out + transfer_in
    assert_eq!(report.transaction_count, 3);
    assert_eq!(report.total_balance_cents, 5100);

    Ok(())
}
