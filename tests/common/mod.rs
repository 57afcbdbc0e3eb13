// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use kasa::application::BankService;

/// Helper to create a fresh, isolated service (each test owns its ledger).
pub fn test_service() -> BankService {
    BankService::new()
}

/// Test fixture: standard account setup
pub struct StandardAccounts;

impl StandardAccounts {
    /// Alice ("100", 50.00) and Bob ("200", 0.00)
    pub fn create_basic(service: &mut BankService) -> Result<()> {
        service.create_account("100", "Alice", "50.00")?;
        service.create_account("200", "Bob", "0")?;
        Ok(())
    }

    /// The basic pair plus Carol ("300", 100.00)
    pub fn create_trio(service: &mut BankService) -> Result<()> {
        Self::create_basic(service)?;
        service.create_account("300", "Carol", "100.00")?;
        Ok(())
    }
}
