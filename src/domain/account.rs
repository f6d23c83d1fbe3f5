use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;

/// What kind of party the ledger account tracks. Customers carry
/// receivables, suppliers payables; staff and workers are internal payables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Customer,
    Supplier,
    Staff,
    Worker,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Customer => "customer",
            AccountKind::Supplier => "supplier",
            AccountKind::Staff => "staff",
            AccountKind::Worker => "worker",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(AccountKind::Customer),
            "supplier" => Some(AccountKind::Supplier),
            "staff" => Some(AccountKind::Staff),
            "worker" => Some(AccountKind::Worker),
            _ => None,
        }
    }
}

/// Company/branch scope a query runs under. A single-company local database
/// uses the nil company id; multi-company data passes explicit ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub company_id: Uuid,
    pub branch_id: Option<Uuid>,
}

impl Scope {
    pub fn company(company_id: Uuid) -> Self {
        Self {
            company_id,
            branch_id: None,
        }
    }

    pub fn with_branch(mut self, branch_id: Uuid) -> Self {
        self.branch_id = Some(branch_id);
        self
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::company(Uuid::nil())
    }
}

/// A ledger subject. Metadata only - balances are always derived from the
/// journal, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    pub company_id: Uuid,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountKind, company_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            company_id,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_kind_round_trip() {
        for kind in [
            AccountKind::Customer,
            AccountKind::Supplier,
            AccountKind::Staff,
            AccountKind::Worker,
        ] {
            assert_eq!(AccountKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(AccountKind::from_str("vendor"), None);
    }

    #[test]
    fn test_new_account() {
        let company = Uuid::new_v4();
        let account = Account::new("Ali Traders", AccountKind::Customer, company)
            .with_description("Walk-in wholesale customer");
        assert_eq!(account.name, "Ali Traders");
        assert_eq!(account.kind, AccountKind::Customer);
        assert_eq!(account.company_id, company);
        assert!(account.description.is_some());
    }
}
