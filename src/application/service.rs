use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    Account, AccountKind, Cents, EntryIdentity, LedgerEntry, Scope, SourceModule,
    aggregate_invoices, build_aging_report, count_statuses, discount_total, running_balances,
    totals,
};
use crate::storage::{NewSale, Repository};

use super::{AppError, LedgerLine, LedgerView};

/// Application service providing the ledger query façade plus the account
/// and seeding operations around it. This is the primary interface for any
/// client (CLI, export, API).
pub struct LedgerService {
    repo: Repository,
}

/// Parameters of one ledger query. `today` is explicit so aging output is
/// reproducible; only the CLI boundary defaults it to the wall clock.
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub today: DateTime<Utc>,
}

impl LedgerQuery {
    pub fn as_of(today: DateTime<Utc>) -> Self {
        Self {
            from: None,
            to: None,
            search: None,
            today,
        }
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Fields accepted when seeding a journal row through the CLI.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: DateTime<Utc>,
    pub debit: Cents,
    pub credit: Cents,
    pub entry_no: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub source: SourceModule,
    pub sale_id: Option<Uuid>,
    pub payment_id: Option<Uuid>,
}

impl LedgerService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account operations
    // ========================

    pub async fn create_account(
        &self,
        name: String,
        kind: AccountKind,
        scope: Scope,
        description: Option<String>,
    ) -> Result<Account, AppError> {
        if self
            .repo
            .get_account_by_name(&name, scope.company_id)
            .await?
            .is_some()
        {
            return Err(AppError::AccountAlreadyExists(name));
        }

        let mut account = Account::new(name, kind, scope.company_id);
        if let Some(desc) = description {
            account = account.with_description(desc);
        }

        self.repo.save_account(&account).await?;
        Ok(account)
    }

    pub async fn get_account(&self, name: &str, scope: Scope) -> Result<Account, AppError> {
        self.repo
            .get_account_by_name(name, scope.company_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))
    }

    pub async fn list_accounts(&self, scope: Scope) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts(scope.company_id).await?)
    }

    // ========================
    // Seeding operations
    // ========================

    /// Record a journal row. Amounts must be non-negative; a row with both
    /// sides zero is accepted as a non-movement metadata row.
    pub async fn record_entry(
        &self,
        account_name: &str,
        scope: Scope,
        new: NewEntry,
    ) -> Result<LedgerEntry, AppError> {
        if new.debit < 0 || new.credit < 0 {
            return Err(AppError::InvalidAmount(
                "Debit and credit must be non-negative".to_string(),
            ));
        }

        let account = self.get_account(account_name, scope).await?;

        let mut entry = LedgerEntry::new(account.id, new.date, new.debit, new.credit)
            .with_source(new.source);
        if let Some(entry_no) = new.entry_no {
            entry = entry.with_entry_no(entry_no);
        }
        if let Some(description) = new.description {
            entry = entry.with_description(description);
        }
        if let Some(notes) = new.notes {
            entry = entry.with_notes(notes);
        }
        if let Some(sale_id) = new.sale_id {
            entry = entry.with_sale(sale_id);
        }
        if let Some(payment_id) = new.payment_id {
            entry = entry.with_payment(payment_id);
        }

        self.repo.save_entry(&entry, scope).await?;
        Ok(entry)
    }

    /// Record an authoritative sale/invoice record for the invoice lookup.
    pub async fn record_sale(&self, scope: Scope, sale: NewSale) -> Result<Uuid, AppError> {
        if sale.total < 0 || sale.paid_amount < 0 {
            return Err(AppError::InvalidAmount(
                "Sale amounts must be non-negative".to_string(),
            ));
        }
        Ok(self.repo.save_sale(&sale, scope).await?)
    }

    // ========================
    // Ledger query façade
    // ========================

    /// Compute the full ledger view for one account. Pure recomputation on
    /// every call: identical arguments and an unchanged journal produce an
    /// identical view.
    pub async fn ledger(
        &self,
        account_name: &str,
        scope: Scope,
        query: LedgerQuery,
    ) -> Result<LedgerView, AppError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AppError::InvalidDateRange {
                    from: from.to_rfc3339(),
                    to: to.to_rfc3339(),
                });
            }
        }

        let account = self.get_account(account_name, scope).await?;

        // Entry fetch failure is fatal: no ledger without entries.
        let entries = self
            .repo
            .fetch_entries(account.id, scope, query.from, query.to)
            .await?;
        debug!(
            account = %account.name,
            entries = entries.len(),
            from = ?query.from,
            to = ?query.to,
            "fetched ledger entries"
        );

        // Opening balance reflects the true pre-range state of the account,
        // independent of the in-range set and of any search filter.
        let opening_balance = match query.from {
            Some(from) => self.repo.opening_balance(account.id, scope, from).await?,
            None => 0,
        };

        // Invoice aggregation and aging run over the unfiltered in-range
        // set; a text search must not skew invoice-level figures.
        let details = self.invoice_details_for(&entries, scope).await;
        let invoices = aggregate_invoices(&entries, &details);
        let status_counts = count_statuses(&invoices);
        let discounts = discount_total(&entries);
        let aging = build_aging_report(&invoices, query.today);

        // Search filtering happens before balances/totals so the summary
        // figures always describe the rows actually displayed.
        let displayed: Vec<LedgerEntry> = match query.search.as_deref() {
            Some(search) if !search.trim().is_empty() => entries
                .iter()
                .filter(|e| e.matches_search(search))
                .cloned()
                .collect(),
            _ => entries,
        };

        let balances = running_balances(opening_balance, &displayed);
        let balance_totals = totals(opening_balance, &displayed);
        let lines = displayed
            .into_iter()
            .zip(balances)
            .map(|(entry, running_balance)| LedgerLine {
                entry,
                running_balance,
            })
            .collect();

        let invoice_totals = LedgerView::invoice_totals_of(&invoices);

        Ok(LedgerView {
            account_id: account.id,
            account_name: account.name,
            lines,
            totals: balance_totals,
            invoices,
            invoice_totals,
            status_counts,
            discount_total: discounts,
            aging,
        })
    }

    /// Aging report alone, over the account's full journal.
    pub async fn aging(
        &self,
        account_name: &str,
        scope: Scope,
        today: DateTime<Utc>,
    ) -> Result<crate::domain::AgingReport, AppError> {
        let account = self.get_account(account_name, scope).await?;
        let entries = self.repo.fetch_entries(account.id, scope, None, None).await?;
        let details = self.invoice_details_for(&entries, scope).await;
        let invoices = aggregate_invoices(&entries, &details);
        Ok(build_aging_report(&invoices, today))
    }

    /// Look up a single entry by whatever reference the caller holds:
    /// reference number first, UUID second.
    pub async fn find_entry(
        &self,
        raw_reference: &str,
        scope: Scope,
    ) -> Result<LedgerEntry, AppError> {
        let found = match EntryIdentity::resolve(raw_reference) {
            EntryIdentity::ByReference(reference) => {
                self.repo.find_entry_by_reference(&reference, scope).await?
            }
            EntryIdentity::ById(id) => self.repo.find_entry_by_id(id, scope).await?,
        };
        found.ok_or_else(|| AppError::EntryNotFound(raw_reference.to_string()))
    }

    /// Invoice lookup round-trip. Unavailable lookups and missing sales are
    /// non-fatal: the aggregator degrades to its debit-sum fallback.
    async fn invoice_details_for(
        &self,
        entries: &[LedgerEntry],
        scope: Scope,
    ) -> HashMap<Uuid, crate::domain::InvoiceDetails> {
        let mut sale_ids: Vec<Uuid> = Vec::new();
        for entry in entries {
            if let Some(sale_id) = entry.sale_id {
                if !sale_ids.contains(&sale_id) {
                    sale_ids.push(sale_id);
                }
            }
        }
        if sale_ids.is_empty() {
            return HashMap::new();
        }

        match self.repo.fetch_invoice_details(&sale_ids, scope).await {
            Ok(details) => details,
            Err(err) => {
                warn!(error = %err, "invoice lookup unavailable, falling back to journal sums");
                HashMap::new()
            }
        }
    }
}
