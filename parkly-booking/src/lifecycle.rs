use crate::models::{Booking, BookingStatus, PaymentStatus};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Completed bookings cannot be cancelled")]
    CannotCancelCompleted,

    #[error("Payment has already been processed for this booking")]
    AlreadyProcessed,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Cancellation gate: cancelled and completed are terminal for this path.
pub fn ensure_cancellable(booking: &Booking) -> Result<(), LifecycleError> {
    match booking.status {
        BookingStatus::Cancelled => Err(LifecycleError::AlreadyCancelled),
        BookingStatus::Completed => Err(LifecycleError::CannotCancelCompleted),
        _ => Ok(()),
    }
}

/// Verification gate: a booking whose payment is already settled must not be
/// re-verified (the idempotency guard), and only pending bookings can be
/// confirmed at all.
pub fn ensure_verifiable(booking: &Booking) -> Result<(), LifecycleError> {
    if booking.payment_status == PaymentStatus::Paid {
        return Err(LifecycleError::AlreadyProcessed);
    }
    if booking.status != BookingStatus::Pending {
        return Err(LifecycleError::InvalidTransition {
            from: booking.status.as_str().to_string(),
            to: BookingStatus::Confirmed.as_str().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewBooking;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn pending_booking() -> Booking {
        let start = Utc::now() + Duration::hours(1);
        Booking::new(NewBooking {
            user_id: Uuid::new_v4(),
            parking_spot_id: Uuid::new_v4(),
            car_id: None,
            start_time: start,
            end_time: start + Duration::hours(2),
            hours: 2,
            total_amount: 200,
            special_requests: None,
        })
    }

    #[test]
    fn test_new_booking_is_pending_pending() {
        let b = pending_booking();
        assert_eq!(b.status, BookingStatus::Pending);
        assert_eq!(b.payment_status, PaymentStatus::Pending);
        assert!(ensure_cancellable(&b).is_ok());
        assert!(ensure_verifiable(&b).is_ok());
    }

    #[test]
    fn test_confirmed_booking_is_cancellable_but_not_verifiable() {
        let mut b = pending_booking();
        b.mark_confirmed("pay_1".to_string(), "sig".to_string());
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert_eq!(b.payment_status, PaymentStatus::Paid);

        assert!(ensure_cancellable(&b).is_ok());
        assert_eq!(ensure_verifiable(&b), Err(LifecycleError::AlreadyProcessed));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let mut b = pending_booking();
        b.mark_cancelled(Some("changed plans".to_string()));
        assert!(b.status.is_terminal());
        assert!(b.cancelled_at.is_some());
        assert_eq!(
            ensure_cancellable(&b),
            Err(LifecycleError::AlreadyCancelled)
        );
    }

    #[test]
    fn test_completed_cannot_cancel() {
        let mut b = pending_booking();
        b.status = BookingStatus::Completed;
        assert_eq!(
            ensure_cancellable(&b),
            Err(LifecycleError::CannotCancelCompleted)
        );
    }

    #[test]
    fn test_failed_booking_rejects_verification() {
        let mut b = pending_booking();
        b.mark_failed("signature mismatch".to_string());
        assert_eq!(b.payment_status, PaymentStatus::Failed);
        assert!(matches!(
            ensure_verifiable(&b),
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }
}
