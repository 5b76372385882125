use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status in the lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Failed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            "failed" => Some(BookingStatus::Failed),
            _ => None,
        }
    }

    /// Terminal states reject further mutation via the cancellation path.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// One reservation attempt and its payment lifecycle. `hours` and
/// `total_amount` are server-computed; nothing here is trusted from the
/// caller except the time window and references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parking_spot_id: Uuid,
    pub car_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub hours: i64,
    /// Major currency units.
    pub total_amount: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub payment_signature: Option<String>,
    pub booking_code: String,
    pub special_requests: Option<String>,
    pub failure_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a booking record, produced by the handler
/// after quoting.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub parking_spot_id: Uuid,
    pub car_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub hours: i64,
    pub total_amount: i64,
    pub special_requests: Option<String>,
}

impl Booking {
    pub fn new(input: NewBooking) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            parking_spot_id: input.parking_spot_id,
            car_id: input.car_id,
            start_time: input.start_time,
            end_time: input.end_time,
            hours: input.hours,
            total_amount: input.total_amount,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            order_id: None,
            payment_id: None,
            payment_signature: None,
            booking_code: crate::code::generate(),
            special_requests: input.special_requests,
            failure_reason: None,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_confirmed(&mut self, payment_id: String, signature: String) {
        self.status = BookingStatus::Confirmed;
        self.payment_status = PaymentStatus::Paid;
        self.payment_id = Some(payment_id);
        self.payment_signature = Some(signature);
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, reason: String) {
        self.status = BookingStatus::Failed;
        self.payment_status = PaymentStatus::Failed;
        self.failure_reason = Some(reason);
        self.updated_at = Utc::now();
    }

    pub fn mark_cancelled(&mut self, reason: Option<String>) {
        self.status = BookingStatus::Cancelled;
        self.cancellation_reason = reason;
        self.cancelled_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }
}
