use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date range: from {from} is after to {to}")]
    InvalidDateRange { from: String, to: String },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
