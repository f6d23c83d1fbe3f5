use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::stdout;
use uuid::Uuid;

use crate::application::{LedgerQuery, LedgerService, LedgerView, NewEntry};
use crate::domain::{AccountKind, Scope, SourceModule, format_cents, parse_cents};
use crate::io::Exporter;
use crate::storage::NewSale;

/// Saldo - Retail Back-Office Ledger
#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "A local-first ledger reconciliation engine for retail back offices")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "saldo.db")]
    pub database: String,

    /// Company scope (UUID; omit for a single-company database)
    #[arg(long, global = true)]
    pub company: Option<String>,

    /// Branch scope (UUID; omit for all branches)
    #[arg(long, global = true)]
    pub branch: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Journal entry commands
    #[command(subcommand)]
    Entry(EntryCommands),

    /// Sale/invoice record commands
    #[command(subcommand)]
    Sale(SaleCommands),

    /// Compute and display the full ledger view for an account
    Ledger {
        /// Account name
        account: String,

        /// Range start (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// Range end (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Case-insensitive text filter over reference, description,
        /// source module, and amount
        #[arg(short, long)]
        search: Option<String>,

        /// Reference date for aging (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<String>,

        /// Output format: table, csv, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show the receivables aging report for an account
    Aging {
        /// Account name
        account: String,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new ledger account
    Add {
        /// Account name (unique per company)
        name: String,

        /// Account kind: customer, supplier, staff, worker
        #[arg(short = 'k', long = "kind", default_value = "customer")]
        kind: String,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// List accounts
    List,
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Record a journal entry against an account
    Add {
        /// Account name
        account: String,

        /// Debit amount (e.g. "1000" or "1000.00")
        #[arg(long, default_value = "0")]
        debit: String,

        /// Credit amount
        #[arg(long, default_value = "0")]
        credit: String,

        /// Entry date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Reference number, e.g. "JE-0058"
        #[arg(short, long)]
        number: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,

        /// Source module: Sale, Payment, Expense, Manual, ...
        #[arg(long, default_value = "Manual")]
        source: String,

        /// Linked sale id (UUID)
        #[arg(long)]
        sale: Option<String>,

        /// Linked payment id (UUID)
        #[arg(long)]
        payment: Option<String>,
    },

    /// Show one entry by reference number or UUID
    Show {
        /// Reference number ("JE-0058") or entry UUID
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum SaleCommands {
    /// Record an authoritative sale/invoice record
    Add {
        /// Invoice number, e.g. "INV-0001"
        invoice_no: String,

        /// Invoice total (e.g. "1000.00")
        #[arg(long)]
        total: String,

        /// Amount already paid
        #[arg(long, default_value = "0")]
        paid: String,

        /// Invoice date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Explicit sale id (UUID, generated if omitted)
        #[arg(long)]
        id: Option<String>,
    },
}

impl Cli {
    fn scope(&self) -> Result<Scope> {
        let company_id = match &self.company {
            Some(raw) => Uuid::parse_str(raw).context("Invalid company ID (expected UUID)")?,
            None => Uuid::nil(),
        };
        let branch_id = self
            .branch
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .context("Invalid branch ID (expected UUID)")?;
        Ok(Scope {
            company_id,
            branch_id,
        })
    }

    pub async fn run(self) -> Result<()> {
        let scope = self.scope()?;

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_account_command(&service, scope, account_cmd).await?;
            }

            Commands::Entry(entry_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_entry_command(&service, scope, entry_cmd).await?;
            }

            Commands::Sale(sale_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_sale_command(&service, scope, sale_cmd).await?;
            }

            Commands::Ledger {
                account,
                from,
                to,
                search,
                today,
                format,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;

                let from = from.as_deref().map(parse_start_of_day).transpose()?;
                let to = to.as_deref().map(parse_end_of_day).transpose()?;
                let today = parse_today(today.as_deref())?;

                let mut query = LedgerQuery::as_of(today).between(from, to);
                if let Some(search) = search {
                    query = query.with_search(search);
                }

                let view = service.ledger(&account, scope, query).await?;
                write_ledger_view(&view, &format, output.as_deref())?;
            }

            Commands::Aging { account, today } => {
                let service = LedgerService::connect(&self.database).await?;
                let today = parse_today(today.as_deref())?;
                let report = service.aging(&account, scope, today).await?;

                println!("Aging report for {} (as of {})", account, today.format("%Y-%m-%d"));
                println!("  Current : {:>14}", format_cents(report.current));
                println!("  1-30    : {:>14}", format_cents(report.days_1_30));
                println!("  31-60   : {:>14}", format_cents(report.days_31_60));
                println!("  61-90   : {:>14}", format_cents(report.days_61_90));
                println!("  90+     : {:>14}", format_cents(report.days_90_plus));
                println!("  Total   : {:>14}", format_cents(report.total));
            }
        }

        Ok(())
    }
}

async fn run_account_command(
    service: &LedgerService,
    scope: Scope,
    command: AccountCommands,
) -> Result<()> {
    match command {
        AccountCommands::Add {
            name,
            kind,
            description,
        } => {
            let kind = AccountKind::from_str(&kind).with_context(|| {
                format!("Invalid account kind '{kind}'. Use customer, supplier, staff, or worker")
            })?;
            let account = service
                .create_account(name, kind, scope, description)
                .await?;
            println!("Created {} account: {} ({})", kind.as_str(), account.name, account.id);
        }

        AccountCommands::List => {
            let accounts = service.list_accounts(scope).await?;
            if accounts.is_empty() {
                println!("No accounts.");
                return Ok(());
            }
            println!("{:<30} {:<10} {}", "NAME", "KIND", "ID");
            for account in accounts {
                println!(
                    "{:<30} {:<10} {}",
                    account.name,
                    account.kind.as_str(),
                    account.id
                );
            }
        }
    }
    Ok(())
}

async fn run_entry_command(
    service: &LedgerService,
    scope: Scope,
    command: EntryCommands,
) -> Result<()> {
    match command {
        EntryCommands::Add {
            account,
            debit,
            credit,
            date,
            number,
            description,
            notes,
            source,
            sale,
            payment,
        } => {
            let debit = parse_cents(&debit).context("Invalid debit amount")?;
            let credit = parse_cents(&credit).context("Invalid credit amount")?;
            let date = match date {
                Some(raw) => parse_start_of_day(&raw)?,
                None => Utc::now(),
            };
            let sale_id = sale
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .context("Invalid sale ID (expected UUID)")?;
            let payment_id = payment
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .context("Invalid payment ID (expected UUID)")?;

            let entry = service
                .record_entry(
                    &account,
                    scope,
                    NewEntry {
                        date,
                        debit,
                        credit,
                        entry_no: number,
                        description,
                        notes,
                        source: SourceModule::from_tag(&source),
                        sale_id,
                        payment_id,
                    },
                )
                .await?;

            println!(
                "Recorded entry {} on {}: debit {} / credit {} ({})",
                entry.entry_no.as_deref().unwrap_or("-"),
                entry.date.format("%Y-%m-%d"),
                format_cents(entry.debit),
                format_cents(entry.credit),
                entry.id
            );
        }

        EntryCommands::Show { reference } => {
            let entry = service.find_entry(&reference, scope).await?;
            println!("Entry       : {}", entry.id);
            println!("Reference   : {}", entry.entry_no.as_deref().unwrap_or("-"));
            println!("Date        : {}", entry.date.format("%Y-%m-%d"));
            println!("Source      : {}", entry.source.as_str());
            println!("Debit       : {}", format_cents(entry.debit));
            println!("Credit      : {}", format_cents(entry.credit));
            println!("Description : {}", entry.description.as_deref().unwrap_or("-"));
            println!("Notes       : {}", entry.notes.as_deref().unwrap_or("-"));
            if let Some(sale_id) = entry.sale_id {
                println!("Sale        : {sale_id}");
            }
            if let Some(payment_id) = entry.payment_id {
                println!("Payment     : {payment_id}");
            }
        }
    }
    Ok(())
}

async fn run_sale_command(
    service: &LedgerService,
    scope: Scope,
    command: SaleCommands,
) -> Result<()> {
    match command {
        SaleCommands::Add {
            invoice_no,
            total,
            paid,
            date,
            id,
        } => {
            let total = parse_cents(&total).context("Invalid total amount")?;
            let paid_amount = parse_cents(&paid).context("Invalid paid amount")?;
            let invoice_date = match date {
                Some(raw) => parse_start_of_day(&raw)?,
                None => Utc::now(),
            };
            let id = id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .context("Invalid sale ID (expected UUID)")?;

            let sale_id = service
                .record_sale(
                    scope,
                    NewSale {
                        id,
                        invoice_no: invoice_no.clone(),
                        invoice_date,
                        total,
                        paid_amount,
                    },
                )
                .await?;

            println!("Recorded sale {invoice_no}: total {} ({sale_id})", format_cents(total));
        }
    }
    Ok(())
}

fn write_ledger_view(view: &LedgerView, format: &str, output: Option<&str>) -> Result<()> {
    let exporter = Exporter::new(view);
    match (format, output) {
        ("table", _) => print_ledger_table(view),
        ("csv", None) => {
            exporter.ledger_csv(stdout())?;
        }
        ("csv", Some(path)) => {
            let file = File::create(path).with_context(|| format!("Cannot create {path}"))?;
            let count = exporter.ledger_csv(file)?;
            println!("Exported {count} entries to {path}");
        }
        ("json", None) => {
            exporter.ledger_json(stdout())?;
        }
        ("json", Some(path)) => {
            let file = File::create(path).with_context(|| format!("Cannot create {path}"))?;
            exporter.ledger_json(file)?;
            println!("Exported ledger view to {path}");
        }
        (other, _) => anyhow::bail!("Unknown format '{other}'. Use table, csv, or json"),
    }
    Ok(())
}

fn print_ledger_table(view: &LedgerView) {
    println!("Ledger for {}", view.account_name);
    println!(
        "Opening {} | Debit {} | Credit {} | Closing {}",
        format_cents(view.totals.opening_balance),
        format_cents(view.totals.total_debit),
        format_cents(view.totals.total_credit),
        format_cents(view.totals.closing_balance),
    );
    println!();

    println!(
        "{:<12} {:<12} {:<10} {:<32} {:>12} {:>12} {:>14}",
        "DATE", "REFERENCE", "SOURCE", "DESCRIPTION", "DEBIT", "CREDIT", "BALANCE"
    );
    for line in &view.lines {
        let entry = &line.entry;
        println!(
            "{:<12} {:<12} {:<10} {:<32} {:>12} {:>12} {:>14}",
            entry.date.format("%Y-%m-%d"),
            entry.entry_no.as_deref().unwrap_or("-"),
            entry.source.as_str(),
            entry.description.as_deref().unwrap_or(""),
            if entry.debit > 0 {
                format_cents(entry.debit)
            } else {
                String::new()
            },
            if entry.credit > 0 {
                format_cents(entry.credit)
            } else {
                String::new()
            },
            format_cents(line.running_balance),
        );
    }

    if !view.invoices.is_empty() {
        println!();
        println!(
            "Invoices: {} | Charges {} | Payments {} | Outstanding {} | Discounts {}",
            view.invoice_totals.invoice_count,
            format_cents(view.invoice_totals.charge_total),
            format_cents(view.invoice_totals.payment_total),
            format_cents(view.invoice_totals.outstanding),
            format_cents(view.discount_total),
        );
        println!(
            "Status: {} fully paid, {} partially paid, {} unpaid",
            view.status_counts.fully_paid,
            view.status_counts.partially_paid,
            view.status_counts.unpaid,
        );
        println!(
            "Aging: current {} | 1-30 {} | 31-60 {} | 61-90 {} | 90+ {} | total {}",
            format_cents(view.aging.current),
            format_cents(view.aging.days_1_30),
            format_cents(view.aging.days_31_60),
            format_cents(view.aging.days_61_90),
            format_cents(view.aging.days_90_plus),
            format_cents(view.aging.total),
        );
    }
}

fn parse_naive(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{raw}'. Use YYYY-MM-DD"))
}

fn parse_start_of_day(raw: &str) -> Result<DateTime<Utc>> {
    Ok(parse_naive(raw)?.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

/// Range ends are inclusive of the whole day.
fn parse_end_of_day(raw: &str) -> Result<DateTime<Utc>> {
    Ok(parse_naive(raw)?.and_hms_opt(23, 59, 59).unwrap().and_utc())
}

fn parse_today(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => parse_start_of_day(raw),
        None => Ok(Utc::now()),
    }
}
