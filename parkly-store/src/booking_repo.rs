use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkly_booking::models::{Booking, BookingStatus, PaymentStatus};
use parkly_booking::BookingRepository;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, user_id, parking_spot_id, car_id, start_time, end_time, hours, \
     total_amount, status, payment_status, order_id, payment_id, payment_signature, booking_code, \
     special_requests, failure_reason, cancellation_reason, cancelled_at, created_at, updated_at";

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn booking_from_row(row: &PgRow) -> Result<Booking, Box<dyn std::error::Error + Send + Sync>> {
    let status_raw: String = row.try_get("status")?;
    let status = BookingStatus::parse(&status_raw)
        .ok_or_else(|| format!("Unknown booking status in store: {status_raw}"))?;

    let payment_raw: String = row.try_get("payment_status")?;
    let payment_status = PaymentStatus::parse(&payment_raw)
        .ok_or_else(|| format!("Unknown payment status in store: {payment_raw}"))?;

    Ok(Booking {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        parking_spot_id: row.try_get("parking_spot_id")?,
        car_id: row.try_get("car_id")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        hours: row.try_get("hours")?,
        total_amount: row.try_get("total_amount")?,
        status,
        payment_status,
        order_id: row.try_get("order_id")?,
        payment_id: row.try_get("payment_id")?,
        payment_signature: row.try_get("payment_signature")?,
        booking_code: row.try_get("booking_code")?,
        special_requests: row.try_get("special_requests")?,
        failure_reason: row.try_get("failure_reason")?,
        cancellation_reason: row.try_get("cancellation_reason")?,
        cancelled_at: row.try_get("cancelled_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            "INSERT INTO bookings (id, user_id, parking_spot_id, car_id, start_time, end_time, \
             hours, total_amount, status, payment_status, order_id, payment_id, payment_signature, \
             booking_code, special_requests, failure_reason, cancellation_reason, cancelled_at, \
             created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.parking_spot_id)
        .bind(booking.car_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.hours)
        .bind(booking.total_amount)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.order_id)
        .bind(&booking.payment_id)
        .bind(&booking.payment_signature)
        .bind(&booking.booking_code)
        .bind(&booking.special_requests)
        .bind(&booking.failure_reason)
        .bind(&booking.cancellation_reason)
        .bind(booking.cancelled_at)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn set_order_id(
        &self,
        id: Uuid,
        order_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("UPDATE bookings SET order_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_confirmed_if_pending(
        &self,
        id: Uuid,
        payment_id: &str,
        signature: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        // Conditional claim: only one verifier can flip pending -> paid.
        let sql = format!(
            "UPDATE bookings
             SET status = 'confirmed', payment_status = 'paid', payment_id = $2,
                 payment_signature = $3, updated_at = NOW()
             WHERE id = $1 AND payment_status = 'pending'
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(payment_id)
            .bind(signature)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn mark_failed_if_pending(
        &self,
        id: Uuid,
        reason: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            "UPDATE bookings
             SET status = 'failed', payment_status = 'failed', failure_reason = $2,
                 updated_at = NOW()
             WHERE id = $1 AND payment_status = 'pending'
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(reason)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn cancel(
        &self,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            "UPDATE bookings
             SET status = 'cancelled', cancellation_reason = $2, cancelled_at = NOW(),
                 updated_at = NOW()
             WHERE id = $1 AND status NOT IN ('cancelled', 'completed')
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(reason)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn set_payment_refunded(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("UPDATE bookings SET payment_status = 'refunded', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn expire_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        // Same pending-only claim as the verifier, so a checkout finishing
        // concurrently with the sweep can never be clobbered.
        let sql = format!(
            "UPDATE bookings
             SET status = 'failed', payment_status = 'failed',
                 failure_reason = 'payment window expired', updated_at = NOW()
             WHERE status = 'pending' AND payment_status = 'pending' AND created_at < $1
             RETURNING {BOOKING_COLUMNS}"
        );
        let rows = sqlx::query(&sql).bind(cutoff).fetch_all(&self.pool).await?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn count_confirmed_for_spot(
        &self,
        spot_id: Uuid,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM bookings WHERE parking_spot_id = $1 AND status = 'confirmed'",
        )
        .bind(spot_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("total")?)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.iter().map(booking_from_row).collect()
    }
}
