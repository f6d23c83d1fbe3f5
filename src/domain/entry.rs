use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, format_cents};

pub type EntryId = Uuid;
pub type AccountId = Uuid;
pub type SaleId = Uuid;
pub type PaymentId = Uuid;

/// Which part of the system produced a journal row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceModule {
    Sale,
    Payment,
    Expense,
    Manual,
    Other(String),
}

impl SourceModule {
    pub fn as_str(&self) -> &str {
        match self {
            SourceModule::Sale => "Sale",
            SourceModule::Payment => "Payment",
            SourceModule::Expense => "Expense",
            SourceModule::Manual => "Manual",
            SourceModule::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Sale" => SourceModule::Sale,
            "Payment" => SourceModule::Payment,
            "Expense" => SourceModule::Expense,
            "Manual" => SourceModule::Manual,
            other => SourceModule::Other(other.to_string()),
        }
    }
}

/// One row of the append-only journal, as the engine sees it.
/// Entries are read-only inputs - the engine derives running balances and
/// aggregates from them but never writes them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    /// Human-readable reference like "JE-0058" or "EXP-0001". Not unique
    /// across entry kinds.
    pub entry_no: Option<String>,
    pub date: DateTime<Utc>,
    pub account_id: AccountId,
    /// Non-negative. A row with debit and credit both zero is a
    /// non-movement metadata row and is skipped by the totals.
    pub debit: Cents,
    pub credit: Cents,
    /// Advisory pre-computed balance from the external source. The engine
    /// always recomputes and never trusts this blindly.
    pub balance_hint: Option<Cents>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub source: SourceModule,
    /// Groups entries under one sale/invoice.
    pub sale_id: Option<SaleId>,
    /// Marks a payment-origin entry.
    pub payment_id: Option<PaymentId>,
}

impl LedgerEntry {
    pub fn new(account_id: AccountId, date: DateTime<Utc>, debit: Cents, credit: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry_no: None,
            date,
            account_id,
            debit,
            credit,
            balance_hint: None,
            description: None,
            notes: None,
            source: SourceModule::Manual,
            sale_id: None,
            payment_id: None,
        }
    }

    pub fn with_entry_no(mut self, entry_no: impl Into<String>) -> Self {
        self.entry_no = Some(entry_no.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_source(mut self, source: SourceModule) -> Self {
        self.source = source;
        self
    }

    pub fn with_sale(mut self, sale_id: SaleId) -> Self {
        self.sale_id = Some(sale_id);
        self
    }

    pub fn with_payment(mut self, payment_id: PaymentId) -> Self {
        self.payment_id = Some(payment_id);
        self
    }

    pub fn with_balance_hint(mut self, hint: Cents) -> Self {
        self.balance_hint = Some(hint);
        self
    }

    /// Net effect of this row on a debit-positive running balance.
    pub fn movement(&self) -> Cents {
        self.debit - self.credit
    }

    /// False for metadata rows that carry no amounts.
    pub fn is_movement(&self) -> bool {
        self.debit != 0 || self.credit != 0
    }

    /// True if the entry is payment-origin: tagged Payment or linked to a
    /// payment record.
    pub fn is_payment_origin(&self) -> bool {
        self.source == SourceModule::Payment || self.payment_id.is_some()
    }

    /// Case-insensitive description heuristic. Discount credits reduce the
    /// receivable but are not payments received.
    pub fn mentions_discount(&self) -> bool {
        description_contains(self.description.as_deref(), "discount")
    }

    /// Commission rows are cost entries unrelated to the customer-facing
    /// invoice and are excluded from charge/payment reconciliation.
    pub fn mentions_commission(&self) -> bool {
        description_contains(self.description.as_deref(), "commission")
    }

    /// Case-insensitive substring match against reference number,
    /// description, source module, and the displayed debit+credit amount.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        if let Some(entry_no) = &self.entry_no {
            if entry_no.to_lowercase().contains(&query) {
                return true;
            }
        }
        if let Some(description) = &self.description {
            if description.to_lowercase().contains(&query) {
                return true;
            }
        }
        if self.source.as_str().to_lowercase().contains(&query) {
            return true;
        }
        format_cents(self.debit + self.credit).contains(&query)
    }
}

fn description_contains(description: Option<&str>, needle: &str) -> bool {
    description
        .map(|d| d.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// How callers identify a single entry. Depending on the screen that
/// produced the reference it may be a reference number ("JE-0058"), a UUID,
/// or an opaque string; resolution happens here once instead of being
/// sniffed ad hoc at every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryIdentity {
    ByReference(String),
    ById(EntryId),
}

impl EntryIdentity {
    /// Priority: reference-number shape first, UUID second, opaque
    /// reference fallback.
    pub fn resolve(raw: &str) -> Self {
        let raw = raw.trim();
        if looks_like_reference_no(raw) {
            return EntryIdentity::ByReference(raw.to_string());
        }
        if let Ok(id) = Uuid::parse_str(raw) {
            return EntryIdentity::ById(id);
        }
        EntryIdentity::ByReference(raw.to_string())
    }
}

/// Reference numbers look like "JE-0058" or "EXP-0001": an alphabetic
/// prefix, a dash, then digits.
fn looks_like_reference_no(raw: &str) -> bool {
    match raw.split_once('-') {
        Some((prefix, suffix)) => {
            !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_alphabetic())
                && !suffix.is_empty()
                && suffix.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(debit: Cents, credit: Cents) -> LedgerEntry {
        LedgerEntry::new(Uuid::new_v4(), Utc::now(), debit, credit)
    }

    #[test]
    fn test_movement_rows() {
        assert!(entry(1000, 0).is_movement());
        assert!(entry(0, 400).is_movement());
        assert!(!entry(0, 0).is_movement());
        assert_eq!(entry(1000, 400).movement(), 600);
    }

    #[test]
    fn test_payment_origin() {
        let tagged = entry(0, 400).with_source(SourceModule::Payment);
        assert!(tagged.is_payment_origin());

        let linked = entry(0, 400).with_payment(Uuid::new_v4());
        assert!(linked.is_payment_origin());

        assert!(!entry(0, 400).with_source(SourceModule::Sale).is_payment_origin());
    }

    #[test]
    fn test_description_heuristics() {
        let discount = entry(0, 100).with_description("Early payment DISCOUNT applied");
        assert!(discount.mentions_discount());
        assert!(!discount.mentions_commission());

        let commission = entry(500, 0).with_description("Commission - Jan");
        assert!(commission.mentions_commission());

        assert!(!entry(100, 0).mentions_discount());
    }

    #[test]
    fn test_matches_search() {
        let e = entry(100000, 0)
            .with_entry_no("JE-0058")
            .with_description("Sale Invoice INV-001")
            .with_source(SourceModule::Sale);

        assert!(e.matches_search("je-0058"));
        assert!(e.matches_search("invoice"));
        assert!(e.matches_search("sale"));
        assert!(e.matches_search("1000")); // displayed amount "1000.00"
        assert!(!e.matches_search("payment"));
        assert!(e.matches_search("  ")); // blank matches everything
    }

    #[test]
    fn test_identity_resolution_priority() {
        assert_eq!(
            EntryIdentity::resolve("JE-0058"),
            EntryIdentity::ByReference("JE-0058".to_string())
        );

        let id = Uuid::new_v4();
        assert_eq!(
            EntryIdentity::resolve(&id.to_string()),
            EntryIdentity::ById(id)
        );

        // Opaque strings fall back to reference lookup
        assert_eq!(
            EntryIdentity::resolve("legacy_ref_99"),
            EntryIdentity::ByReference("legacy_ref_99".to_string())
        );
    }

    #[test]
    fn test_source_module_round_trip() {
        assert_eq!(SourceModule::from_tag("Payment"), SourceModule::Payment);
        assert_eq!(SourceModule::from_tag("Sale").as_str(), "Sale");
        assert_eq!(
            SourceModule::from_tag("Rental"),
            SourceModule::Other("Rental".to_string())
        );
    }
}
