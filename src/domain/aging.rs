use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, InvoiceSummary};

/// Outstanding receivables bucketed by days elapsed since the invoice date.
/// The five buckets are mutually exclusive and `total` always equals the sum
/// of outstanding amounts over the classified invoices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingReport {
    pub current: Cents,
    pub days_1_30: Cents,
    pub days_31_60: Cents,
    pub days_61_90: Cents,
    pub days_90_plus: Cents,
    pub total: Cents,
}

/// Classify every invoice with a positive outstanding balance into one aging
/// bucket, using days = floor((today - invoice_date) / 1 day). Fully paid
/// and in-credit invoices are excluded entirely. `today` is caller-supplied
/// so the report is reproducible.
pub fn build_aging_report(invoices: &[InvoiceSummary], today: DateTime<Utc>) -> AgingReport {
    let mut report = AgingReport::default();

    for invoice in invoices {
        let outstanding = invoice.outstanding();
        if outstanding <= 0 {
            continue;
        }

        let days = (today - invoice.invoice_date).num_days();
        if days <= 0 {
            report.current += outstanding;
        } else if days <= 30 {
            report.days_1_30 += outstanding;
        } else if days <= 60 {
            report.days_31_60 += outstanding;
        } else if days <= 90 {
            report.days_61_90 += outstanding;
        } else {
            report.days_90_plus += outstanding;
        }
        report.total += outstanding;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn today() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn invoice_aged(days: i64, charge: Cents, paid: Cents) -> InvoiceSummary {
        InvoiceSummary {
            sale_id: Uuid::new_v4(),
            invoice_no: format!("INV-{days:03}"),
            invoice_date: today() - Duration::days(days),
            charge_total: charge,
            payment_total: paid,
        }
    }

    #[test]
    fn test_bucket_boundaries_inclusive() {
        let cases = [
            (0, "current"),
            (1, "1-30"),
            (30, "1-30"),
            (31, "31-60"),
            (60, "31-60"),
            (61, "61-90"),
            (90, "61-90"),
            (91, "90+"),
        ];

        for (days, bucket) in cases {
            let report = build_aging_report(&[invoice_aged(days, 1000, 0)], today());
            let expected = |c, d30, d60, d90, d90p| AgingReport {
                current: c,
                days_1_30: d30,
                days_31_60: d60,
                days_61_90: d90,
                days_90_plus: d90p,
                total: 1000,
            };
            let want = match bucket {
                "current" => expected(1000, 0, 0, 0, 0),
                "1-30" => expected(0, 1000, 0, 0, 0),
                "31-60" => expected(0, 0, 1000, 0, 0),
                "61-90" => expected(0, 0, 0, 1000, 0),
                _ => expected(0, 0, 0, 0, 1000),
            };
            assert_eq!(report, want, "day offset {days}");
        }
    }

    #[test]
    fn test_future_dated_invoice_is_current() {
        let report = build_aging_report(&[invoice_aged(-5, 1000, 0)], today());
        assert_eq!(report.current, 1000);
    }

    #[test]
    fn test_settled_invoices_excluded() {
        let invoices = vec![
            invoice_aged(10, 1000, 1000), // fully paid
            invoice_aged(10, 1000, 1200), // in credit
            invoice_aged(10, 1000, 400),
        ];
        let report = build_aging_report(&invoices, today());
        assert_eq!(report.days_1_30, 600);
        assert_eq!(report.total, 600);
    }

    #[test]
    fn test_total_equals_sum_of_outstanding() {
        let invoices = vec![
            invoice_aged(0, 50000, 0),
            invoice_aged(15, 100000, 40000),
            invoice_aged(45, 20000, 0),
            invoice_aged(75, 30000, 10000),
            invoice_aged(120, 80000, 0),
            invoice_aged(33, 10000, 10000), // excluded
        ];

        let report = build_aging_report(&invoices, today());
        let outstanding_sum: Cents = invoices
            .iter()
            .map(InvoiceSummary::outstanding)
            .filter(|o| *o > 0)
            .sum();

        assert_eq!(report.total, outstanding_sum);
        assert_eq!(
            report.total,
            report.current
                + report.days_1_30
                + report.days_31_60
                + report.days_61_90
                + report.days_90_plus
        );
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(build_aging_report(&[], today()), AgingReport::default());
    }
}
