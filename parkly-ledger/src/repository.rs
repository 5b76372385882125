use crate::transaction::{Transaction, TransactionType};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("Insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: i64, requested: i64 },

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Ledger storage error: {0}")]
    Storage(String),
}

/// Wallet plus append-only transaction history. Implementations must pair
/// every wallet mutation with its transaction insert in one atomic unit;
/// a crash can never leave a balance change without its ledger row.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Increase the wallet by `amount` (> 0) and append the matching entry.
    /// Returns the written transaction, snapshots included.
    async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        tx_type: TransactionType,
        booking_id: Option<Uuid>,
        description: &str,
        metadata: serde_json::Value,
    ) -> Result<Transaction, LedgerError>;

    /// Decrease the wallet by `amount` (> 0), failing with
    /// `InsufficientBalance` before any write if the wallet cannot cover it.
    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        tx_type: TransactionType,
        booking_id: Option<Uuid>,
        description: &str,
        metadata: serde_json::Value,
    ) -> Result<Transaction, LedgerError>;

    /// Append a platform_fee entry without mutating the wallet.
    async fn record_fee(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        fee_amount: i64,
        description: &str,
    ) -> Result<Transaction, LedgerError>;

    /// The earning entry written when a booking's payment was verified, if
    /// any. Cancellation reverses exactly this amount, not a recomputation.
    async fn earning_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<Transaction>, LedgerError>;

    async fn get_balance(&self, user_id: Uuid) -> Result<i64, LedgerError>;

    /// Newest-first transaction history.
    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError>;
}
