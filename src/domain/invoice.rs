use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, LedgerEntry, SaleId};

/// Authoritative invoice record from the sales table, keyed by sale id.
/// The journal may not capture every charge component (line-item detail
/// lives with the sale), so this is the preferred charge source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDetails {
    pub invoice_no: String,
    pub invoice_date: DateTime<Utc>,
    pub total: Cents,
    pub paid_amount: Cents,
    pub due_amount: Cents,
}

/// Payment state of a single invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    FullyPaid,
    PartiallyPaid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::FullyPaid => "fully paid",
            PaymentStatus::PartiallyPaid => "partially paid",
            PaymentStatus::Unpaid => "unpaid",
        }
    }
}

/// Per-invoice reconciliation of charges vs. payments. Derived, never
/// persisted; recomputed from scratch on every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub sale_id: SaleId,
    pub invoice_no: String,
    pub invoice_date: DateTime<Utc>,
    pub charge_total: Cents,
    pub payment_total: Cents,
}

impl InvoiceSummary {
    pub fn outstanding(&self) -> Cents {
        self.charge_total - self.payment_total
    }

    /// None when the charge total is zero: an invoice with no determinable
    /// charge cannot be classified.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        if self.charge_total == 0 {
            return None;
        }
        if self.outstanding() <= 0 {
            Some(PaymentStatus::FullyPaid)
        } else if self.payment_total > 0 {
            Some(PaymentStatus::PartiallyPaid)
        } else {
            Some(PaymentStatus::Unpaid)
        }
    }
}

/// Invoice counts by payment status. Unclassifiable invoices (zero charge)
/// are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub fully_paid: usize,
    pub partially_paid: usize,
    pub unpaid: usize,
}

pub fn count_statuses(invoices: &[InvoiceSummary]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for invoice in invoices {
        match invoice.payment_status() {
            Some(PaymentStatus::FullyPaid) => counts.fully_paid += 1,
            Some(PaymentStatus::PartiallyPaid) => counts.partially_paid += 1,
            Some(PaymentStatus::Unpaid) => counts.unpaid += 1,
            None => {}
        }
    }
    counts
}

/// Group the full (unfiltered) entry set by sale and derive one
/// InvoiceSummary per distinct sale id, in first-encounter order.
///
/// Charge priority: the authoritative sale total when the lookup has the
/// record, else the sum of that sale's debit entries - never both, so a
/// charge is not double-counted. Payment total sums payment-origin credits,
/// excluding discounts. Commission entries contribute to neither side.
/// A sale id with no lookup record degrades to the debit-sum fallback
/// instead of failing the aggregation.
pub fn aggregate_invoices(
    entries: &[LedgerEntry],
    details: &HashMap<SaleId, InvoiceDetails>,
) -> Vec<InvoiceSummary> {
    struct SaleGroup {
        first_date: DateTime<Utc>,
        first_reference: Option<String>,
        debit_total: Cents,
        payment_total: Cents,
    }

    let mut order: Vec<SaleId> = Vec::new();
    let mut groups: HashMap<SaleId, SaleGroup> = HashMap::new();

    for entry in entries {
        let Some(sale_id) = entry.sale_id else {
            continue;
        };
        if entry.mentions_commission() {
            continue;
        }

        let group = groups.entry(sale_id).or_insert_with(|| {
            order.push(sale_id);
            SaleGroup {
                first_date: entry.date,
                first_reference: entry.entry_no.clone(),
                debit_total: 0,
                payment_total: 0,
            }
        });

        group.debit_total += entry.debit;
        if entry.credit > 0 && entry.is_payment_origin() && !entry.mentions_discount() {
            group.payment_total += entry.credit;
        }
    }

    order
        .into_iter()
        .map(|sale_id| {
            let group = &groups[&sale_id];
            match details.get(&sale_id) {
                Some(detail) => InvoiceSummary {
                    sale_id,
                    invoice_no: detail.invoice_no.clone(),
                    invoice_date: detail.invoice_date,
                    charge_total: detail.total,
                    payment_total: group.payment_total,
                },
                None => InvoiceSummary {
                    sale_id,
                    invoice_no: group
                        .first_reference
                        .clone()
                        .unwrap_or_else(|| sale_id.to_string()),
                    invoice_date: group.first_date,
                    charge_total: group.debit_total,
                    payment_total: group.payment_total,
                },
            }
        })
        .collect()
}

/// Company-wide discount figure: credits whose description mentions a
/// discount, summed over the full entry set. Tracked separately from
/// per-invoice payment totals.
pub fn discount_total(entries: &[LedgerEntry]) -> Cents {
    entries
        .iter()
        .filter(|e| e.credit > 0 && e.mentions_discount() && !e.mentions_commission())
        .map(|e| e.credit)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceModule;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn entry_on(day: u32, debit: Cents, credit: Cents) -> LedgerEntry {
        let date = Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap();
        LedgerEntry::new(Uuid::new_v4(), date, debit, credit)
    }

    fn details_for(
        sale_id: SaleId,
        total: Cents,
        paid: Cents,
    ) -> HashMap<SaleId, InvoiceDetails> {
        let mut map = HashMap::new();
        map.insert(
            sale_id,
            InvoiceDetails {
                invoice_no: "INV-001".to_string(),
                invoice_date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                total,
                paid_amount: paid,
                due_amount: total - paid,
            },
        );
        map
    }

    #[test]
    fn test_charge_prefers_authoritative_total() {
        let sale = Uuid::new_v4();
        // Journal only captured 80000 of the 100000 invoice.
        let entries = vec![entry_on(1, 80000, 0).with_sale(sale)];
        let invoices = aggregate_invoices(&entries, &details_for(sale, 100000, 0));

        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].charge_total, 100000);
        assert_eq!(invoices[0].invoice_no, "INV-001");
    }

    #[test]
    fn test_charge_falls_back_to_debit_sum() {
        let sale = Uuid::new_v4();
        let entries = vec![
            entry_on(1, 60000, 0).with_sale(sale).with_entry_no("JE-0012"),
            entry_on(2, 40000, 0).with_sale(sale),
        ];
        // Sale deleted/inaccessible: no lookup record.
        let invoices = aggregate_invoices(&entries, &HashMap::new());

        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].charge_total, 100000);
        assert_eq!(invoices[0].invoice_no, "JE-0012");
        assert_eq!(
            invoices[0].invoice_date,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_payment_total_counts_payment_origin_credits() {
        let sale = Uuid::new_v4();
        let entries = vec![
            entry_on(1, 100000, 0).with_sale(sale),
            entry_on(5, 0, 40000)
                .with_sale(sale)
                .with_source(SourceModule::Payment),
            // Credit without payment origin: not a payment received.
            entry_on(6, 0, 5000).with_sale(sale).with_source(SourceModule::Sale),
            // Linked payment id counts even without the Payment tag.
            entry_on(7, 0, 10000).with_sale(sale).with_payment(Uuid::new_v4()),
        ];
        let invoices = aggregate_invoices(&entries, &HashMap::new());

        assert_eq!(invoices[0].payment_total, 50000);
        assert_eq!(invoices[0].outstanding(), 50000);
    }

    #[test]
    fn test_discount_credit_is_not_a_payment() {
        let sale = Uuid::new_v4();
        let entries = vec![
            entry_on(1, 100000, 0).with_sale(sale),
            entry_on(5, 0, 40000)
                .with_sale(sale)
                .with_source(SourceModule::Payment),
            entry_on(5, 0, 5000)
                .with_sale(sale)
                .with_source(SourceModule::Payment)
                .with_description("Early settlement discount"),
        ];
        let invoices = aggregate_invoices(&entries, &HashMap::new());

        assert_eq!(invoices[0].payment_total, 40000);
        assert_eq!(discount_total(&entries), 5000);
    }

    #[test]
    fn test_commission_excluded_from_both_sides() {
        let sale = Uuid::new_v4();
        let entries = vec![
            entry_on(1, 100000, 0).with_sale(sale),
            entry_on(2, 7000, 0)
                .with_sale(sale)
                .with_description("Commission - Jan"),
            entry_on(3, 0, 7000)
                .with_sale(sale)
                .with_source(SourceModule::Payment)
                .with_description("Commission - Jan payout"),
        ];
        let invoices = aggregate_invoices(&entries, &HashMap::new());

        assert_eq!(invoices[0].charge_total, 100000);
        assert_eq!(invoices[0].payment_total, 0);
    }

    #[test]
    fn test_standalone_entries_produce_no_invoice() {
        let entries = vec![entry_on(1, 5000, 0), entry_on(2, 0, 5000)];
        assert!(aggregate_invoices(&entries, &HashMap::new()).is_empty());
    }

    #[test]
    fn test_payment_status_classification() {
        let sale = Uuid::new_v4();
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let summary = |charge, paid| InvoiceSummary {
            sale_id: sale,
            invoice_no: "INV-001".to_string(),
            invoice_date: date,
            charge_total: charge,
            payment_total: paid,
        };

        assert_eq!(
            summary(100000, 100000).payment_status(),
            Some(PaymentStatus::FullyPaid)
        );
        // Overpayment still classifies as fully paid.
        assert_eq!(
            summary(100000, 120000).payment_status(),
            Some(PaymentStatus::FullyPaid)
        );
        assert_eq!(
            summary(100000, 40000).payment_status(),
            Some(PaymentStatus::PartiallyPaid)
        );
        assert_eq!(
            summary(100000, 0).payment_status(),
            Some(PaymentStatus::Unpaid)
        );
        assert_eq!(summary(0, 0).payment_status(), None);
    }

    #[test]
    fn test_status_counts_skip_zero_charge_invoices() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let summary = |charge, paid| InvoiceSummary {
            sale_id: Uuid::new_v4(),
            invoice_no: String::new(),
            invoice_date: date,
            charge_total: charge,
            payment_total: paid,
        };

        let invoices = vec![
            summary(100000, 100000),
            summary(100000, 40000),
            summary(100000, 0),
            summary(0, 0),
        ];
        let counts = count_statuses(&invoices);
        assert_eq!(
            counts,
            StatusCounts {
                fully_paid: 1,
                partially_paid: 1,
                unpaid: 1,
            }
        );
    }

    #[test]
    fn test_first_encounter_order_is_stable() {
        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());
        let entries = vec![
            entry_on(3, 100, 0).with_sale(s2),
            entry_on(1, 200, 0).with_sale(s1),
            entry_on(5, 300, 0).with_sale(s2),
        ];
        let invoices = aggregate_invoices(&entries, &HashMap::new());
        assert_eq!(invoices[0].sale_id, s2);
        assert_eq!(invoices[1].sale_id, s1);
        assert_eq!(invoices[0].charge_total, 400);
    }
}
