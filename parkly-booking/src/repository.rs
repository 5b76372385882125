use crate::models::Booking;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Data access for bookings. The `*_if_pending` operations are conditional
/// single-statement claims: exactly one caller can win each transition, which
/// is what makes duplicate payment verification and the stale-booking reaper
/// safe against each other.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Persist the gateway order reference after order creation succeeds.
    async fn set_order_id(
        &self,
        id: Uuid,
        order_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Compensation for gateway failure: the record never existed as far as
    /// the caller is concerned.
    async fn delete(&self, id: Uuid) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Atomically transition pending -> confirmed/paid, persisting the
    /// gateway payment id and signature. Returns the updated booking, or
    /// `None` if the payment was no longer pending (a concurrent caller won).
    async fn mark_confirmed_if_pending(
        &self,
        id: Uuid,
        payment_id: &str,
        signature: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Atomically transition pending -> failed/failed with a reason. Returns
    /// `None` if the payment was no longer pending.
    async fn mark_failed_if_pending(
        &self,
        id: Uuid,
        reason: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Atomically cancel unless already cancelled/completed. Returns the
    /// updated booking, or `None` when a concurrent caller got there first.
    async fn cancel(
        &self,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Flip payment_status to refunded after a paid cancellation's reversal.
    async fn set_payment_refunded(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Reaper sweep: fail every booking still pending/pending created before
    /// the cutoff, returning the claimed rows so their slots can be released.
    async fn expire_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    async fn count_confirmed_for_spot(
        &self,
        spot_id: Uuid,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>>;
}
