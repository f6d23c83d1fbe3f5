use anyhow::Result;
use std::io::Write;

use crate::application::LedgerView;
use crate::domain::format_cents;

/// Exporter for rendering a computed ledger view in machine-readable
/// formats. Pure over the view: exporting never re-queries.
pub struct Exporter<'a> {
    view: &'a LedgerView,
}

impl<'a> Exporter<'a> {
    pub fn new(view: &'a LedgerView) -> Self {
        Self { view }
    }

    /// Ledger table as CSV: an opening-balance row, one row per displayed
    /// entry, and a closing-balance row.
    pub fn ledger_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "date",
            "reference_no",
            "document_type",
            "description",
            "notes",
            "debit",
            "credit",
            "running_balance",
        ])?;

        csv_writer.write_record([
            "-",
            "Opening Balance",
            "-",
            "Opening Balance",
            "-",
            "",
            "",
            &format_cents(self.view.totals.opening_balance),
        ])?;

        let mut count = 0;
        for line in &self.view.lines {
            let entry = &line.entry;
            csv_writer.write_record([
                entry.date.format("%Y-%m-%d").to_string(),
                entry.entry_no.clone().unwrap_or_default(),
                entry.source.as_str().to_string(),
                entry.description.clone().unwrap_or_default(),
                entry.notes.clone().unwrap_or_default(),
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
            ])?;
            count += 1;
        }

        csv_writer.write_record([
            "-",
            "Closing Balance",
            "-",
            "Closing Balance",
            "-",
            &format_cents(self.view.totals.total_debit),
            &format_cents(self.view.totals.total_credit),
            &format_cents(self.view.totals.closing_balance),
        ])?;

        csv_writer.flush()?;
        Ok(count)
    }

    /// Aging buckets as CSV, one row per bucket plus the total.
    pub fn aging_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let aging = &self.view.aging;

        csv_writer.write_record(["bucket", "outstanding"])?;
        csv_writer.write_record(["current", &format_cents(aging.current)])?;
        csv_writer.write_record(["1-30", &format_cents(aging.days_1_30)])?;
        csv_writer.write_record(["31-60", &format_cents(aging.days_31_60)])?;
        csv_writer.write_record(["61-90", &format_cents(aging.days_61_90)])?;
        csv_writer.write_record(["90+", &format_cents(aging.days_90_plus)])?;
        csv_writer.write_record(["total", &format_cents(aging.total)])?;

        csv_writer.flush()?;
        Ok(())
    }

    /// The whole view as pretty JSON for downstream formatters.
    pub fn ledger_json<W: Write>(&self, mut writer: W) -> Result<()> {
        let json = serde_json::to_string_pretty(self.view)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{InvoiceTotals, LedgerLine};
    use crate::domain::{
        AgingReport, BalanceTotals, LedgerEntry, SourceModule, StatusCounts,
    };
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_view() -> LedgerView {
        let account_id = Uuid::new_v4();
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let entry = LedgerEntry::new(account_id, date, 100000, 0)
            .with_entry_no("JE-0001")
            .with_description("Sale Invoice INV-001")
            .with_source(SourceModule::Sale);

        LedgerView {
            account_id,
            account_name: "Ali Traders".to_string(),
            lines: vec![LedgerLine {
                entry,
                running_balance: 100000,
            }],
            totals: BalanceTotals {
                opening_balance: 0,
                total_debit: 100000,
                total_credit: 0,
                closing_balance: 100000,
            },
            invoices: vec![],
            invoice_totals: InvoiceTotals::default(),
            status_counts: StatusCounts::default(),
            discount_total: 0,
            aging: AgingReport::default(),
        }
    }

    #[test]
    fn test_ledger_csv_has_opening_and_closing_rows() {
        let view = sample_view();
        let mut buffer = Vec::new();
        let count = Exporter::new(&view).ledger_csv(&mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(count, 1);
        assert_eq!(rows.len(), 4); // header + opening + 1 entry + closing
        assert!(rows[1].contains("Opening Balance"));
        assert!(rows[2].contains("JE-0001"));
        assert!(rows[2].contains("1000.00"));
        assert!(rows[3].contains("Closing Balance"));
    }

    #[test]
    fn test_aging_csv_lists_all_buckets() {
        let mut view = sample_view();
        view.aging = AgingReport {
            current: 0,
            days_1_30: 60000,
            days_31_60: 0,
            days_61_90: 0,
            days_90_plus: 0,
            total: 60000,
        };

        let mut buffer = Vec::new();
        Exporter::new(&view).aging_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("1-30,600.00"));
        assert!(text.contains("total,600.00"));
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn test_ledger_json_round_trips() {
        let view = sample_view();
        let mut buffer = Vec::new();
        Exporter::new(&view).ledger_json(&mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["account_name"], "Ali Traders");
        assert_eq!(parsed["totals"]["closing_balance"], 100000);
    }
}
