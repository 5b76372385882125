pub mod commission;
pub mod repository;
pub mod transaction;

pub use commission::CommissionSplit;
pub use repository::{LedgerError, LedgerRepository};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
