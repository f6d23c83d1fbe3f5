pub mod application;
pub mod cli;
pub mod domain;
pub mod io;
pub mod storage;

pub use application::{LedgerQuery, LedgerService, LedgerView, NewEntry};
pub use domain::*;
pub use storage::{NewSale, Repository};
