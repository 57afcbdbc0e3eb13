use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::BankService;
use crate::domain::{Account, format_cents};

/// Ledger snapshot for the JSON export: every account with its full history.
#[derive(Debug, Serialize)]
pub struct LedgerSnapshot<'a> {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<&'a Account>,
}

/// Exporter for writing ledger data to any sink. The ledger itself stays
/// in-memory; from the menu these write to stdout.
pub struct Exporter<'a> {
    service: &'a BankService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a BankService) -> Self {
        Self { service }
    }

    /// Export one account's history as CSV. Returns the number of rows.
    pub fn export_history_csv<W: Write>(&self, account_id: &str, writer: W) -> Result<usize> {
        let history = self.service.history(account_id)?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["timestamp", "kind", "amount", "counterparty"])?;

        let mut count = 0;
        for tx in history {
            csv_writer.write_record([
                tx.timestamp.to_rfc3339(),
                tx.kind.to_string(),
                format_cents(tx.amount_cents),
                tx.counterparty.clone().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export all accounts with their histories as a JSON snapshot.
    pub fn export_snapshot_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts: self.service.accounts().collect(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(snapshot.accounts.len())
    }
}
