use serde::{Deserialize, Serialize};

use crate::domain::{
    AgingReport, BalanceTotals, Cents, InvoiceSummary, LedgerEntry, StatusCounts,
};

/// One displayed ledger row: the journal entry plus the running balance the
/// engine derived for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerLine {
    pub entry: LedgerEntry,
    pub running_balance: Cents,
}

/// Totals over the invoices visible in a ledger view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub invoice_count: usize,
    pub charge_total: Cents,
    pub payment_total: Cents,
    pub outstanding: Cents,
}

/// The fully computed ledger for one account and query. Constructed fresh
/// per query and never mutated after return; callers own it for a single
/// render/report cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerView {
    pub account_id: uuid::Uuid,
    pub account_name: String,
    /// Entries after search filtering, with running balances, in date order.
    pub lines: Vec<LedgerLine>,
    /// Opening balance, displayed-set totals, closing balance.
    pub totals: BalanceTotals,
    /// Per-invoice reconciliation over the unfiltered in-range entry set.
    pub invoices: Vec<InvoiceSummary>,
    pub invoice_totals: InvoiceTotals,
    pub status_counts: StatusCounts,
    /// Company-wide discount credits; not part of any per-invoice total.
    pub discount_total: Cents,
    pub aging: AgingReport,
}

impl LedgerView {
    pub fn invoice_totals_of(invoices: &[InvoiceSummary]) -> InvoiceTotals {
        let mut totals = InvoiceTotals {
            invoice_count: invoices.len(),
            ..InvoiceTotals::default()
        };
        for invoice in invoices {
            totals.charge_total += invoice.charge_total;
            totals.payment_total += invoice.payment_total;
        }
        totals.outstanding = totals.charge_total - totals.payment_total;
        totals
    }
}
