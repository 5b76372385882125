use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;
use parkly_ledger::{Transaction, TransactionStatus, TransactionType};
use parkly_shared::models::events::{RealtimeEvent, WalletUpdatedEvent};

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub status: TransactionStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            booking_id: t.booking_id,
            tx_type: t.tx_type,
            amount: t.amount,
            balance_before: t.balance_before,
            balance_after: t.balance_after,
            status: t.status,
            description: t.description,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub transaction: TransactionResponse,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet", get(get_balance))
        .route("/wallet/transactions", get(list_transactions))
        .route("/wallet/withdraw", post(request_withdrawal))
}

/// GET /wallet
async fn get_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user_id = claims.user_id()?;
    let balance = state
        .ledger
        .get_balance(user_id)
        .await
        .map_err(ApiError::from_ledger)?;
    Ok(Json(BalanceResponse { balance }))
}

/// GET /wallet/transactions
async fn list_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let user_id = claims.user_id()?;
    let transactions = state
        .ledger
        .list_transactions(user_id)
        .await
        .map_err(ApiError::from_ledger)?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.into_iter().map(Into::into).collect(),
    }))
}

/// POST /wallet/withdraw
/// The wallet is debited immediately; the transaction stays pending until an
/// admin settles the payout out-of-band.
async fn request_withdrawal(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, ApiError> {
    let user_id = claims.user_id()?;

    let tx = state
        .ledger
        .debit(
            user_id,
            req.amount,
            TransactionType::WithdrawalRequest,
            None,
            "Withdrawal request",
            serde_json::json!({}),
        )
        .await
        .map_err(ApiError::from_ledger)?;

    state.emit(RealtimeEvent::WalletUpdated(WalletUpdatedEvent {
        user_id,
        new_balance: tx.balance_after,
    }));

    tracing::info!("Withdrawal of {} requested by {}", req.amount, user_id);

    Ok(Json(WithdrawResponse {
        transaction: tx.into(),
    }))
}
