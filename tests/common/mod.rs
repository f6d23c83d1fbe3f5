#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use saldo::application::{LedgerService, NewEntry};
use saldo::domain::{AccountKind, Cents, Scope, SourceModule};
use saldo::storage::NewSale;

/// Fresh service over a temp-file SQLite database. The TempDir must stay
/// alive for the duration of the test.
pub async fn test_service() -> (LedgerService, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let service = LedgerService::init(path.to_str().unwrap()).await.unwrap();
    (service, dir)
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn new_entry(entry_date: DateTime<Utc>, debit: Cents, credit: Cents) -> NewEntry {
    NewEntry {
        date: entry_date,
        debit,
        credit,
        entry_no: None,
        description: None,
        notes: None,
        source: SourceModule::Manual,
        sale_id: None,
        payment_id: None,
    }
}

/// A customer account plus one recorded sale: invoice INV-001 for 1000.00
/// dated 2024-03-01, nothing paid yet.
pub async fn seed_customer_with_sale(service: &LedgerService) -> (String, Uuid) {
    let scope = Scope::default();
    service
        .create_account("Ali Traders".to_string(), AccountKind::Customer, scope, None)
        .await
        .unwrap();

    let sale_id = service
        .record_sale(
            scope,
            NewSale {
                id: None,
                invoice_no: "INV-001".to_string(),
                invoice_date: date(2024, 3, 1),
                total: 100_000,
                paid_amount: 0,
            },
        )
        .await
        .unwrap();

    ("Ali Traders".to_string(), sale_id)
}
