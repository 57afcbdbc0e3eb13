use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};

use crate::application::BankService;
use crate::domain::{LedgerError, format_cents, parse_cents};
use crate::io::Exporter;

/// Kasa - In-memory banking ledger
#[derive(Parser)]
#[command(name = "kasa")]
#[command(about = "An in-memory banking ledger driven by an interactive menu")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let mut service = BankService::new();
        let stdin = io::stdin();
        let stdout = io::stdout();
        Menu::new(self.verbose).run(&mut service, &mut stdin.lock(), &mut stdout.lock())
    }
}

/// Whether the menu loop keeps going after a handler returns.
enum Flow {
    Continue,
    Quit,
}

/// The interactive command dispatcher. It owns no state beyond flags: it
/// reads input, parses amounts once at the boundary, calls into the service
/// and presents results. Validation failures are printed and the loop
/// re-prompts; nothing here terminates the process.
///
/// Generic over the reader and writer so tests can script a whole session.
pub struct Menu {
    verbose: bool,
}

impl Menu {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run<R: BufRead, W: Write>(
        &self,
        service: &mut BankService,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        loop {
            writeln!(output)?;
            writeln!(output, "--- kasa ---")?;
            writeln!(output, "1. Create account")?;
            writeln!(output, "2. Deposit")?;
            writeln!(output, "3. Withdraw")?;
            writeln!(output, "4. Transfer")?;
            writeln!(output, "5. Transaction history")?;
            writeln!(output, "6. List accounts")?;
            writeln!(output, "7. Verify integrity")?;
            writeln!(output, "8. Export history (CSV)")?;
            writeln!(output, "9. Export snapshot (JSON)")?;
            writeln!(output, "0. Quit")?;

            let Some(choice) = prompt(input, output, "Choose an option: ")? else {
                break;
            };

            let flow = match choice.as_str() {
                "1" => self.create_account(service, input, output)?,
                "2" => self.deposit(service, input, output)?,
                "3" => self.withdraw(service, input, output)?,
                "4" => self.transfer(service, input, output)?,
                "5" => self.history(service, input, output)?,
                "6" => self.list_accounts(service, output)?,
                "7" => self.check_integrity(service, output)?,
                "8" => self.export_history(service, input, output)?,
                "9" => self.export_snapshot(service, output)?,
                "0" => {
                    writeln!(output, "Goodbye.")?;
                    Flow::Quit
                }
                _ => {
                    writeln!(output, "Invalid choice, try again.")?;
                    Flow::Continue
                }
            };

            if matches!(flow, Flow::Quit) {
                break;
            }
        }
        Ok(())
    }

    fn create_account<R: BufRead, W: Write>(
        &self,
        service: &mut BankService,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        let Some(account_id) = prompt(input, output, "Account number: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(owner) = prompt(input, output, "Owner name: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(opening) = prompt(input, output, "Opening balance: ")? else {
            return Ok(Flow::Quit);
        };

        match service.create_account(&account_id, &owner, &opening) {
            Ok(summary) => {
                writeln!(
                    output,
                    "Created account {} for {} with balance {}.",
                    summary.account_id,
                    summary.owner,
                    format_cents(summary.balance_cents)
                )?;
                self.trace(format_args!("created account {}", summary.account_id));
            }
            Err(err) => report_error(output, &err)?,
        }
        Ok(Flow::Continue)
    }

    fn deposit<R: BufRead, W: Write>(
        &self,
        service: &mut BankService,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        let Some(account_id) = prompt(input, output, "Account number: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(amount) = prompt(input, output, "Deposit amount: ")? else {
            return Ok(Flow::Quit);
        };

        match parse_amount(&amount).and_then(|cents| service.deposit(&account_id, cents)) {
            Ok(receipt) => {
                writeln!(
                    output,
                    "Deposited {}. New balance: {}.",
                    format_cents(receipt.transaction.amount_cents),
                    format_cents(receipt.balance_cents)
                )?;
                self.trace(format_args!("deposit on account {account_id}"));
            }
            Err(err) => report_error(output, &err)?,
        }
        Ok(Flow::Continue)
    }

    fn withdraw<R: BufRead, W: Write>(
        &self,
        service: &mut BankService,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        let Some(account_id) = prompt(input, output, "Account number: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(amount) = prompt(input, output, "Withdrawal amount: ")? else {
            return Ok(Flow::Quit);
        };

        match parse_amount(&amount).and_then(|cents| service.withdraw(&account_id, cents)) {
            Ok(receipt) => {
                writeln!(
                    output,
                    "Withdrew {}. New balance: {}.",
                    format_cents(receipt.transaction.amount_cents),
                    format_cents(receipt.balance_cents)
                )?;
                self.trace(format_args!("withdrawal on account {account_id}"));
            }
            Err(err) => report_error(output, &err)?,
        }
        Ok(Flow::Continue)
    }

    fn transfer<R: BufRead, W: Write>(
        &self,
        service: &mut BankService,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        let Some(source_id) = prompt(input, output, "Source account number: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(destination_id) = prompt(input, output, "Destination account number: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(amount) = prompt(input, output, "Transfer amount: ")? else {
            return Ok(Flow::Quit);
        };

        let result = parse_amount(&amount)
            .and_then(|cents| service.transfer(&source_id, cents, &destination_id));
        match result {
            Ok(receipt) => {
                writeln!(
                    output,
                    "Transferred {} from {} to {}.",
                    format_cents(receipt.amount_cents),
                    receipt.source.owner,
                    receipt.destination.owner
                )?;
                writeln!(
                    output,
                    "Balances: {} = {}, {} = {}.",
                    receipt.source.account_id,
                    format_cents(receipt.source.balance_cents),
                    receipt.destination.account_id,
                    format_cents(receipt.destination.balance_cents)
                )?;
                self.trace(format_args!(
                    "transfer {source_id} -> {destination_id}"
                ));
            }
            Err(err) => report_error(output, &err)?,
        }
        Ok(Flow::Continue)
    }

    fn history<R: BufRead, W: Write>(
        &self,
        service: &BankService,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        let Some(account_id) = prompt(input, output, "Account number: ")? else {
            return Ok(Flow::Quit);
        };

        let info = match service.account_info(&account_id) {
            Ok(info) => info,
            Err(err) => {
                report_error(output, &err)?;
                return Ok(Flow::Continue);
            }
        };

        writeln!(
            output,
            "Transaction history for account {} ({}):",
            info.summary.account_id, info.summary.owner
        )?;
        if info.transaction_count == 0 {
            writeln!(output, "No transactions.")?;
        } else {
            for tx in service.history(&account_id)? {
                match &tx.counterparty {
                    Some(counterparty) => writeln!(
                        output,
                        "{} - {}: {} ({})",
                        tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        tx.kind,
                        format_cents(tx.amount_cents),
                        counterparty
                    )?,
                    None => writeln!(
                        output,
                        "{} - {}: {}",
                        tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        tx.kind,
                        format_cents(tx.amount_cents)
                    )?,
                }
            }
        }
        writeln!(
            output,
            "Balance: {}",
            format_cents(info.summary.balance_cents)
        )?;
        Ok(Flow::Continue)
    }

    fn list_accounts<W: Write>(&self, service: &BankService, output: &mut W) -> Result<Flow> {
        let accounts = service.list_accounts();
        if accounts.is_empty() {
            writeln!(output, "No accounts.")?;
            return Ok(Flow::Continue);
        }

        writeln!(output, "{:<12} {:<20} {:>12}", "ACCOUNT", "OWNER", "BALANCE")?;
        writeln!(output, "{}", "-".repeat(46))?;
        for account in &accounts {
            writeln!(
                output,
                "{:<12} {:<20} {:>12}",
                account.account_id,
                account.owner,
                format_cents(account.balance_cents)
            )?;
        }
        writeln!(output, "{}", "-".repeat(46))?;
        writeln!(
            output,
            "{:<12} {:<20} {:>12}",
            "TOTAL",
            "",
            format_cents(service.total_balance_cents())
        )?;
        Ok(Flow::Continue)
    }

    fn check_integrity<W: Write>(&self, service: &BankService, output: &mut W) -> Result<Flow> {
        let report = service.check_integrity();

        writeln!(output, "Accounts:      {}", report.account_count)?;
        writeln!(output, "Transactions:  {}", report.transaction_count)?;
        writeln!(
            output,
            "Total balance: {}",
            format_cents(report.total_balance_cents)
        )?;
        if report.is_ok() {
            writeln!(output, "Integrity: OK")?;
        } else {
            writeln!(output, "Integrity: ISSUES FOUND")?;
            for id in &report.balance_mismatches {
                writeln!(output, "  balance mismatch on account {id}")?;
            }
            for key in &report.key_mismatches {
                writeln!(output, "  key mismatch for entry {key}")?;
            }
            for id in &report.negative_balances {
                writeln!(output, "  negative balance on account {id}")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn export_history<R: BufRead, W: Write>(
        &self,
        service: &BankService,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        let Some(account_id) = prompt(input, output, "Account number: ")? else {
            return Ok(Flow::Quit);
        };

        let exporter = Exporter::new(service);
        match exporter.export_history_csv(&account_id, &mut *output) {
            Ok(count) => self.trace(format_args!("exported {count} rows for {account_id}")),
            Err(err) => writeln!(output, "Error: {err}")?,
        }
        Ok(Flow::Continue)
    }

    fn export_snapshot<W: Write>(&self, service: &BankService, output: &mut W) -> Result<Flow> {
        let exporter = Exporter::new(service);
        match exporter.export_snapshot_json(&mut *output) {
            Ok(count) => self.trace(format_args!("exported {count} accounts")),
            Err(err) => writeln!(output, "Error: {err}")?,
        }
        Ok(Flow::Continue)
    }

    fn trace(&self, args: std::fmt::Arguments<'_>) {
        if self.verbose {
            eprintln!("[kasa] {args}");
        }
    }
}

/// Parse a user-typed amount into cents, folding parse failures into the
/// `InvalidAmount` kind so the dispatcher reports one message per kind.
fn parse_amount(input: &str) -> Result<crate::domain::Cents, LedgerError> {
    parse_cents(input).map_err(|_| LedgerError::InvalidAmount)
}

/// Print a label, read one line. `None` means EOF (treated as quit).
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> Result<Option<String>> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn report_error<W: Write>(output: &mut W, err: &LedgerError) -> Result<()> {
    writeln!(output, "Error: {err}")?;
    Ok(())
}
