use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Earning,
    PlatformFee,
    Refund,
    WithdrawalRequest,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Earning => "earning",
            TransactionType::PlatformFee => "platform_fee",
            TransactionType::Refund => "refund",
            TransactionType::WithdrawalRequest => "withdrawal_request",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "earning" => Some(TransactionType::Earning),
            "platform_fee" => Some(TransactionType::PlatformFee),
            "refund" => Some(TransactionType::Refund),
            "withdrawal_request" => Some(TransactionType::WithdrawalRequest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(TransactionStatus::Completed),
            "pending" => Some(TransactionStatus::Pending),
            "rejected" => Some(TransactionStatus::Rejected),
            _ => None,
        }
    }
}

/// One append-only ledger entry. `amount` is signed; `balance_before` and
/// `balance_after` are captured at write time and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub status: TransactionStatus,
    pub description: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Entry for a wallet mutation. `signed_amount` is positive for credits,
    /// negative for debits; the snapshot pair must reflect exactly this one
    /// mutation.
    pub fn wallet_mutation(
        user_id: Uuid,
        booking_id: Option<Uuid>,
        tx_type: TransactionType,
        signed_amount: i64,
        balance_before: i64,
        status: TransactionStatus,
        description: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            booking_id,
            tx_type,
            amount: signed_amount,
            balance_before,
            balance_after: balance_before + signed_amount,
            status,
            description,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Entry that records money retained by the platform without touching
    /// the owner's wallet. Both snapshots carry the current balance.
    pub fn platform_fee(
        user_id: Uuid,
        booking_id: Uuid,
        fee_amount: i64,
        current_balance: i64,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            booking_id: Some(booking_id),
            tx_type: TransactionType::PlatformFee,
            amount: -fee_amount,
            balance_before: current_balance,
            balance_after: current_balance,
            status: TransactionStatus::Completed,
            description,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    /// Snapshot invariant for wallet-mutating entries.
    pub fn is_balanced(&self) -> bool {
        self.balance_after - self.balance_before == self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_entry_is_balanced() {
        let tx = Transaction::wallet_mutation(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            TransactionType::Earning,
            170,
            0,
            TransactionStatus::Completed,
            "Earnings for booking".to_string(),
            serde_json::json!({}),
        );
        assert_eq!(tx.balance_after, 170);
        assert!(tx.is_balanced());
    }

    #[test]
    fn test_debit_entry_is_balanced() {
        let tx = Transaction::wallet_mutation(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            TransactionType::Refund,
            -170,
            170,
            TransactionStatus::Completed,
            "Refund reversal".to_string(),
            serde_json::json!({}),
        );
        assert_eq!(tx.balance_after, 0);
        assert!(tx.is_balanced());
    }

    #[test]
    fn test_fee_entry_leaves_balance_untouched() {
        let tx = Transaction::platform_fee(
            Uuid::new_v4(),
            Uuid::new_v4(),
            30,
            170,
            "Platform commission".to_string(),
        );
        assert_eq!(tx.amount, -30);
        assert_eq!(tx.balance_before, tx.balance_after);
    }

    #[test]
    fn test_type_round_trip() {
        for t in [
            TransactionType::Earning,
            TransactionType::PlatformFee,
            TransactionType::Refund,
            TransactionType::WithdrawalRequest,
        ] {
            assert_eq!(TransactionType::parse(t.as_str()), Some(t));
        }
        assert_eq!(TransactionType::parse("bogus"), None);
    }
}
