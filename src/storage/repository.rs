use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AccountKind, Cents, InvoiceDetails, LedgerEntry, SaleId, Scope,
    SourceModule,
};

use super::MIGRATION_001_INITIAL;

/// Fields accepted when recording an authoritative sale/invoice record.
#[derive(Debug, Clone)]
pub struct NewSale {
    /// Explicit id, or None to generate one.
    pub id: Option<SaleId>,
    pub invoice_no: String,
    pub invoice_date: DateTime<Utc>,
    pub total: Cents,
    pub paid_amount: Cents,
}

/// SQLite-backed store. The read paths are the engine's two collaborator
/// interfaces (entry source and invoice lookup); the write paths exist for
/// seeding through the CLI and the test suite.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, company_id, name, kind, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.company_id.to_string())
        .bind(&account.name)
        .bind(account.kind.as_str())
        .bind(&account.description)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    pub async fn get_account_by_name(
        &self,
        name: &str,
        company_id: Uuid,
    ) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, name, kind, description, created_at
            FROM accounts
            WHERE name = ? AND company_id = ?
            "#,
        )
        .bind(name)
        .bind(company_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_accounts(&self, company_id: Uuid) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, name, kind, description, created_at
            FROM accounts
            WHERE company_id = ?
            ORDER BY name
            "#,
        )
        .bind(company_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let company_str: String = row.get("company_id");
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            company_id: Uuid::parse_str(&company_str).context("Invalid company ID")?,
            name: row.get("name"),
            kind: AccountKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid account kind: {}", kind_str))?,
            description: row.get("description"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Journal operations
    // ========================

    pub async fn save_entry(&self, entry: &LedgerEntry, scope: Scope) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries
                (id, company_id, branch_id, account_id, entry_no, entry_date,
                 debit, credit, balance_hint, description, notes, source_module,
                 sale_id, payment_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(scope.company_id.to_string())
        .bind(scope.branch_id.map(|id| id.to_string()))
        .bind(entry.account_id.to_string())
        .bind(&entry.entry_no)
        .bind(entry.date.to_rfc3339())
        .bind(entry.debit)
        .bind(entry.credit)
        .bind(entry.balance_hint)
        .bind(&entry.description)
        .bind(&entry.notes)
        .bind(entry.source.as_str())
        .bind(entry.sale_id.map(|id| id.to_string()))
        .bind(entry.payment_id.map(|id| id.to_string()))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save ledger entry")?;
        Ok(())
    }

    /// Entry source: the journal rows for one account within scope, ordered
    /// ascending by date (insertion order breaks ties). A fetch failure
    /// propagates - no ledger can be computed without entries. A row whose
    /// stored date fails to parse is excluded and logged rather than
    /// aborting the whole ledger.
    pub async fn fetch_entries(
        &self,
        account_id: AccountId,
        scope: Scope,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<LedgerEntry>> {
        let mut sql = String::from(
            r#"
            SELECT id, account_id, entry_no, entry_date, debit, credit,
                   balance_hint, description, notes, source_module, sale_id, payment_id
            FROM ledger_entries
            WHERE account_id = ? AND company_id = ?
            "#,
        );
        if scope.branch_id.is_some() {
            sql.push_str(" AND branch_id = ?");
        }
        if from.is_some() {
            sql.push_str(" AND entry_date >= ?");
        }
        if to.is_some() {
            sql.push_str(" AND entry_date <= ?");
        }
        sql.push_str(" ORDER BY entry_date ASC, created_at ASC");

        let mut query = sqlx::query(&sql)
            .bind(account_id.to_string())
            .bind(scope.company_id.to_string());
        if let Some(branch_id) = scope.branch_id {
            query = query.bind(branch_id.to_string());
        }
        if let Some(from) = from {
            query = query.bind(from.to_rfc3339());
        }
        if let Some(to) = to {
            query = query.bind(to.to_rfc3339());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch ledger entries")?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(entry) = Self::row_to_entry(row)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Opening balance for a date range: sum of all movements strictly
    /// before `before`, recomputed from the journal. Stored balance hints
    /// are advisory and deliberately not consulted here. Rows with an
    /// unparseable date are excluded and logged, the same policy the entry
    /// fetch applies.
    pub async fn opening_balance(
        &self,
        account_id: AccountId,
        scope: Scope,
        before: DateTime<Utc>,
    ) -> Result<Cents> {
        let mut sql = String::from(
            r#"
            SELECT id, entry_date, debit, credit
            FROM ledger_entries
            WHERE account_id = ? AND company_id = ? AND entry_date < ?
            "#,
        );
        if scope.branch_id.is_some() {
            sql.push_str(" AND branch_id = ?");
        }

        let mut query = sqlx::query(&sql)
            .bind(account_id.to_string())
            .bind(scope.company_id.to_string())
            .bind(before.to_rfc3339());
        if let Some(branch_id) = scope.branch_id {
            query = query.bind(branch_id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute opening balance")?;

        let mut balance: Cents = 0;
        for row in &rows {
            let date_str: String = row.get("entry_date");
            if DateTime::parse_from_rfc3339(&date_str).is_err() {
                let id: String = row.get("id");
                warn!(entry = %id, date = %date_str, "skipping entry with unparseable date in opening balance");
                continue;
            }
            let debit: i64 = row.get("debit");
            let credit: i64 = row.get("credit");
            balance += debit - credit;
        }
        Ok(balance)
    }

    pub async fn find_entry_by_reference(
        &self,
        reference: &str,
        scope: Scope,
    ) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, entry_no, entry_date, debit, credit,
                   balance_hint, description, notes, source_module, sale_id, payment_id
            FROM ledger_entries
            WHERE entry_no = ? COLLATE NOCASE AND company_id = ?
            ORDER BY entry_date ASC
            LIMIT 1
            "#,
        )
        .bind(reference)
        .bind(scope.company_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch entry by reference")?;

        match row {
            Some(row) => Self::row_to_entry(&row),
            None => Ok(None),
        }
    }

    pub async fn find_entry_by_id(
        &self,
        id: Uuid,
        scope: Scope,
    ) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, entry_no, entry_date, debit, credit,
                   balance_hint, description, notes, source_module, sale_id, payment_id
            FROM ledger_entries
            WHERE id = ? AND company_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(scope.company_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch entry by id")?;

        match row {
            Some(row) => Self::row_to_entry(&row),
            None => Ok(None),
        }
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<Option<LedgerEntry>> {
        let id_str: String = row.get("id");
        let account_str: String = row.get("account_id");
        let date_str: String = row.get("entry_date");
        let source_str: String = row.get("source_module");
        let sale_str: Option<String> = row.get("sale_id");
        let payment_str: Option<String> = row.get("payment_id");

        let id = Uuid::parse_str(&id_str).context("Invalid entry ID")?;

        // A single corrupt date must not block visibility into an
        // otherwise valid ledger.
        let date = match DateTime::parse_from_rfc3339(&date_str) {
            Ok(date) => date.with_timezone(&Utc),
            Err(err) => {
                warn!(entry = %id, date = %date_str, error = %err, "skipping entry with unparseable date");
                return Ok(None);
            }
        };

        Ok(Some(LedgerEntry {
            id,
            entry_no: row.get("entry_no"),
            date,
            account_id: Uuid::parse_str(&account_str).context("Invalid account ID on entry")?,
            debit: row.get("debit"),
            credit: row.get("credit"),
            balance_hint: row.get("balance_hint"),
            description: row.get("description"),
            notes: row.get("notes"),
            source: SourceModule::from_tag(&source_str),
            sale_id: sale_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid sale ID on entry")?,
            payment_id: payment_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid payment ID on entry")?,
        }))
    }

    // ========================
    // Sales / invoice lookup
    // ========================

    pub async fn save_sale(&self, sale: &NewSale, scope: Scope) -> Result<SaleId> {
        let id = sale.id.unwrap_or_else(Uuid::new_v4);
        sqlx::query(
            r#"
            INSERT INTO sales (id, company_id, invoice_no, invoice_date, total, paid_amount, due_amount)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(scope.company_id.to_string())
        .bind(&sale.invoice_no)
        .bind(sale.invoice_date.to_rfc3339())
        .bind(sale.total)
        .bind(sale.paid_amount)
        .bind(sale.total - sale.paid_amount)
        .execute(&self.pool)
        .await
        .context("Failed to save sale")?;
        Ok(id)
    }

    /// Invoice lookup: authoritative invoice records for the given sale
    /// ids, within the caller's company. Missing ids (including another
    /// company's sales) are simply absent from the map - a deleted or
    /// inaccessible sale is "unavailable", not an error.
    pub async fn fetch_invoice_details(
        &self,
        sale_ids: &[SaleId],
        scope: Scope,
    ) -> Result<HashMap<SaleId, InvoiceDetails>> {
        if sale_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; sale_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, invoice_no, invoice_date, total, paid_amount, due_amount \
             FROM sales WHERE company_id = ? AND id IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql).bind(scope.company_id.to_string());
        for sale_id in sale_ids {
            query = query.bind(sale_id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch invoice details")?;

        let mut details = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id_str: String = row.get("id");
            let date_str: String = row.get("invoice_date");
            let id = Uuid::parse_str(&id_str).context("Invalid sale ID")?;

            let invoice_date = match DateTime::parse_from_rfc3339(&date_str) {
                Ok(date) => date.with_timezone(&Utc),
                Err(err) => {
                    warn!(sale = %id, date = %date_str, error = %err, "skipping sale with unparseable invoice date");
                    continue;
                }
            };

            details.insert(
                id,
                InvoiceDetails {
                    invoice_no: row.get("invoice_no"),
                    invoice_date,
                    total: row.get("total"),
                    paid_amount: row.get("paid_amount"),
                    due_amount: row.get("due_amount"),
                },
            );
        }
        Ok(details)
    }
}
