use async_trait::async_trait;
use parkly_ledger::transaction::{Transaction, TransactionStatus, TransactionType};
use parkly_ledger::{LedgerError, LedgerRepository};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction as SqlxTx};
use uuid::Uuid;

pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn tx_from_row(row: &PgRow) -> Result<Transaction, LedgerError> {
    let type_raw: String = row.try_get("tx_type").map_err(storage_err)?;
    let tx_type = TransactionType::parse(&type_raw)
        .ok_or_else(|| LedgerError::Storage(format!("Unknown transaction type: {type_raw}")))?;

    let status_raw: String = row.try_get("status").map_err(storage_err)?;
    let status = TransactionStatus::parse(&status_raw)
        .ok_or_else(|| LedgerError::Storage(format!("Unknown transaction status: {status_raw}")))?;

    Ok(Transaction {
        id: row.try_get("id").map_err(storage_err)?,
        user_id: row.try_get("user_id").map_err(storage_err)?,
        booking_id: row.try_get("booking_id").map_err(storage_err)?,
        tx_type,
        amount: row.try_get("amount").map_err(storage_err)?,
        balance_before: row.try_get("balance_before").map_err(storage_err)?,
        balance_after: row.try_get("balance_after").map_err(storage_err)?,
        status,
        description: row.try_get("description").map_err(storage_err)?,
        metadata: row.try_get("metadata").map_err(storage_err)?,
        created_at: row.try_get("created_at").map_err(storage_err)?,
    })
}

async fn insert_transaction(
    db_tx: &mut SqlxTx<'_, Postgres>,
    record: &Transaction,
) -> Result<(), LedgerError> {
    sqlx::query(
        "INSERT INTO transactions (id, user_id, booking_id, tx_type, amount, balance_before, \
         balance_after, status, description, metadata, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(record.id)
    .bind(record.user_id)
    .bind(record.booking_id)
    .bind(record.tx_type.as_str())
    .bind(record.amount)
    .bind(record.balance_before)
    .bind(record.balance_after)
    .bind(record.status.as_str())
    .bind(&record.description)
    .bind(&record.metadata)
    .bind(record.created_at)
    .execute(&mut **db_tx)
    .await
    .map_err(storage_err)?;
    Ok(())
}

/// Lock the user row and return the current balance.
async fn balance_for_update(
    db_tx: &mut SqlxTx<'_, Postgres>,
    user_id: Uuid,
) -> Result<i64, LedgerError> {
    let row = sqlx::query("SELECT wallet_balance FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **db_tx)
        .await
        .map_err(storage_err)?
        .ok_or(LedgerError::UserNotFound(user_id))?;
    row.try_get("wallet_balance").map_err(storage_err)
}

async fn write_balance(
    db_tx: &mut SqlxTx<'_, Postgres>,
    user_id: Uuid,
    new_balance: i64,
) -> Result<(), LedgerError> {
    sqlx::query("UPDATE users SET wallet_balance = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(new_balance)
        .execute(&mut **db_tx)
        .await
        .map_err(storage_err)?;
    Ok(())
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        tx_type: TransactionType,
        booking_id: Option<Uuid>,
        description: &str,
        metadata: serde_json::Value,
    ) -> Result<Transaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut db_tx = self.pool.begin().await.map_err(storage_err)?;
        let balance_before = balance_for_update(&mut db_tx, user_id).await?;

        let record = Transaction::wallet_mutation(
            user_id,
            booking_id,
            tx_type,
            amount,
            balance_before,
            TransactionStatus::Completed,
            description.to_string(),
            metadata,
        );

        write_balance(&mut db_tx, user_id, record.balance_after).await?;
        insert_transaction(&mut db_tx, &record).await?;
        db_tx.commit().await.map_err(storage_err)?;

        Ok(record)
    }

    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        tx_type: TransactionType,
        booking_id: Option<Uuid>,
        description: &str,
        metadata: serde_json::Value,
    ) -> Result<Transaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut db_tx = self.pool.begin().await.map_err(storage_err)?;
        let balance_before = balance_for_update(&mut db_tx, user_id).await?;

        if balance_before < amount {
            return Err(LedgerError::InsufficientBalance {
                available: balance_before,
                requested: amount,
            });
        }

        // Withdrawal requests stay pending until an admin settles them; every
        // other debit is final immediately.
        let status = if tx_type == TransactionType::WithdrawalRequest {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Completed
        };

        let record = Transaction::wallet_mutation(
            user_id,
            booking_id,
            tx_type,
            -amount,
            balance_before,
            status,
            description.to_string(),
            metadata,
        );

        write_balance(&mut db_tx, user_id, record.balance_after).await?;
        insert_transaction(&mut db_tx, &record).await?;
        db_tx.commit().await.map_err(storage_err)?;

        Ok(record)
    }

    async fn record_fee(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        fee_amount: i64,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        if fee_amount <= 0 {
            return Err(LedgerError::InvalidAmount(fee_amount));
        }

        let mut db_tx = self.pool.begin().await.map_err(storage_err)?;
        // Snapshot under the row lock so the recorded balance is the one the
        // paired earning left behind.
        let current = balance_for_update(&mut db_tx, user_id).await?;

        let record = Transaction::platform_fee(
            user_id,
            booking_id,
            fee_amount,
            current,
            description.to_string(),
        );

        insert_transaction(&mut db_tx, &record).await?;
        db_tx.commit().await.map_err(storage_err)?;

        Ok(record)
    }

    async fn earning_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<Transaction>, LedgerError> {
        let row = sqlx::query(
            "SELECT id, user_id, booking_id, tx_type, amount, balance_before, balance_after, \
             status, description, metadata, created_at
             FROM transactions WHERE booking_id = $1 AND tx_type = 'earning'
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.as_ref().map(tx_from_row).transpose()
    }

    async fn get_balance(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        let row = sqlx::query("SELECT wallet_balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?
            .ok_or(LedgerError::UserNotFound(user_id))?;
        row.try_get("wallet_balance").map_err(storage_err)
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        let rows = sqlx::query(
            "SELECT id, user_id, booking_id, tx_type, amount, balance_before, balance_after, \
             status, description, metadata, created_at
             FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(tx_from_row).collect()
    }
}
