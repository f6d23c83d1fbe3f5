mod account;
mod aging;
mod balance;
mod entry;
mod invoice;
mod money;

pub use account::*;
pub use aging::*;
pub use balance::*;
pub use entry::*;
pub use invoice::*;
pub use money::*;
