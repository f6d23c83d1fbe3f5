use serde::{Deserialize, Serialize};

use super::{Cents, LedgerEntry};

/// Opening/closing balance and debit/credit totals for one displayed entry
/// set. Totals are always recomputed from the entries actually shown so the
/// summary strip and the table rows can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    pub opening_balance: Cents,
    pub total_debit: Cents,
    pub total_credit: Cents,
    pub closing_balance: Cents,
}

/// Fold a chronologically ordered entry sequence into per-entry running
/// balances: rb[i] = rb[i-1] + debit[i] - credit[i], seeded with the
/// caller-supplied opening balance.
///
/// Entries are summed in input order. The engine never re-sorts; ascending
/// date order is an input invariant of the entry source, and an out-of-order
/// row is still summed arithmetically.
pub fn running_balances(opening_balance: Cents, entries: &[LedgerEntry]) -> Vec<Cents> {
    let mut balance = opening_balance;
    entries
        .iter()
        .map(|entry| {
            balance += entry.movement();
            balance
        })
        .collect()
}

/// Compute totals over a displayed entry set. Non-movement metadata rows
/// (debit and credit both zero) are skipped.
pub fn totals(opening_balance: Cents, entries: &[LedgerEntry]) -> BalanceTotals {
    let mut total_debit = 0;
    let mut total_credit = 0;
    for entry in entries.iter().filter(|e| e.is_movement()) {
        total_debit += entry.debit;
        total_credit += entry.credit;
    }

    BalanceTotals {
        opening_balance,
        total_debit,
        total_credit,
        closing_balance: opening_balance + total_debit - total_credit,
    }
}

/// Recover the opening balance from the first in-range entry's stored
/// running balance: opening = stored - (debit - credit).
///
/// This is the only supported recovery path when no authoritative opening
/// figure exists. It assumes the stored running balance is itself correct,
/// so it is not a substitute for computing the opening balance from the
/// pre-range entries.
pub fn opening_from_first(first: &LedgerEntry, stored_running: Cents) -> Cents {
    stored_running - first.movement()
}
