use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;
use parkly_booking::lifecycle;
use parkly_booking::models::{Booking, NewBooking, PaymentStatus};
use parkly_catalog::billing;
use parkly_core::notify::BookingNotification;
use parkly_core::signature;
use parkly_shared::pii::Masked;
use parkly_ledger::{CommissionSplit, TransactionType};
use parkly_shared::models::events::{
    BookingConfirmedEvent, RealtimeEvent, SlotUpdatedEvent, WalletUpdatedEvent,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub parking_spot_id: Uuid,
    pub car_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub special_requests: Option<String>,
    // Any hours/amount fields a client sends are ignored; pricing is always
    // computed server-side from the stored rate.
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "bookingId")]
    pub booking_id: Uuid,
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parking_spot_id: Uuid,
    pub car_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub hours: i64,
    pub total_amount: i64,
    pub status: parkly_booking::BookingStatus,
    pub payment_status: PaymentStatus,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub booking_code: String,
    pub special_requests: Option<String>,
    pub failure_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            parking_spot_id: b.parking_spot_id,
            car_id: b.car_id,
            start_time: b.start_time,
            end_time: b.end_time,
            hours: b.hours,
            total_amount: b.total_amount,
            status: b.status,
            payment_status: b.payment_status,
            order_id: b.order_id,
            payment_id: b.payment_id,
            booking_code: b.booking_code,
            special_requests: b.special_requests,
            failure_reason: b.failure_reason,
            cancellation_reason: b.cancellation_reason,
            cancelled_at: b.cancelled_at,
            created_at: b.created_at,
        }
    }
}

/// Checkout-initiation payload. `amount` is the gateway order amount in
/// minor units, which is what the checkout widget expects.
#[derive(Debug, Serialize)]
pub struct OrderPayload {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub booking: BookingResponse,
    pub order: OrderPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub amount: i64,
    pub owner_earnings: i64,
    pub platform_fee: i64,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub booking: BookingResponse,
    pub payment: PaymentSummary,
}

#[derive(Debug, Serialize)]
pub struct BookingEnvelope {
    pub booking: BookingResponse,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingResponse>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/verify-payment", post(verify_payment))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", put(cancel_booking))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /bookings
/// Reserve a slot, create the booking and register a gateway order.
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), ApiError> {
    let user_id = claims.user_id()?;

    // 1. Load the spot
    let spot = state
        .spots
        .get_spot(req.parking_spot_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Parking spot not found".to_string()))?;

    if !spot.is_active {
        return Err(ApiError::Validation(
            "Parking spot is not accepting bookings".to_string(),
        ));
    }

    // 2. Server-side quote; nothing price-related is trusted from the caller
    let quote = billing::quote(
        req.start_time,
        req.end_time,
        Utc::now(),
        spot.price_per_hour,
        state.business_rules.max_booking_hours,
    )
    .map_err(|e| ApiError::Validation(e.to_string()))?;

    // 3. Atomically reserve one slot; losing the race is a clean 400
    let reserved = state
        .spots
        .reserve_slot(spot.id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::SlotUnavailable)?;

    // 4. Create the booking record in pending/pending
    let booking = Booking::new(NewBooking {
        user_id,
        parking_spot_id: spot.id,
        car_id: req.car_id,
        start_time: req.start_time,
        end_time: req.end_time,
        hours: quote.hours,
        total_amount: quote.total_amount,
        special_requests: req.special_requests,
    });

    if let Err(e) = state.bookings.create(&booking).await {
        // The slot was taken out of inventory for a record that never
        // materialized; put it back before failing.
        let _ = state.spots.release_slot(spot.id).await;
        return Err(ApiError::Internal(e.to_string()));
    }

    // 5. Register the order with the gateway. On failure, compensate fully:
    // release the slot and remove the just-created booking.
    let order = match state
        .payments
        .create_order(
            booking.total_amount,
            &state.payment.currency,
            &booking.booking_code,
        )
        .await
    {
        Ok(order) => order,
        Err(e) => {
            tracing::error!("Gateway order creation failed for {}: {}", booking.id, e);
            let _ = state.spots.release_slot(spot.id).await;
            let _ = state.bookings.delete(booking.id).await;
            return Err(ApiError::PaymentGatewayUnavailable);
        }
    };

    state
        .bookings
        .set_order_id(booking.id, &order.id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    // 6. Tell observers about the new slot count
    state.emit(RealtimeEvent::SlotUpdated(SlotUpdatedEvent {
        parking_id: spot.id,
        available_slots: reserved.available_slots,
    }));
    refresh_availability_mirror(&state, spot.id, reserved.available_slots).await;

    let mut booking = booking;
    booking.order_id = Some(order.id.clone());

    tracing::info!(
        "Booking {} created for spot {} ({} hours, {} {})",
        booking.booking_code,
        spot.id,
        booking.hours,
        booking.total_amount,
        state.payment.currency
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking: booking.into(),
            order: OrderPayload {
                id: order.id,
                amount: order.amount,
                currency: order.currency,
                key: state.payment.key_id.clone(),
            },
        }),
    ))
}

/// POST /bookings/verify-payment
/// The single trust boundary: convert a gateway confirmation into a
/// confirmed booking and an owner payout, or reject it safely.
async fn verify_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let user_id = claims.user_id()?;

    // 1. Load the booking
    let booking = state
        .bookings
        .get(req.booking_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    if booking.user_id != user_id {
        return Err(ApiError::Forbidden(
            "This booking belongs to another user".to_string(),
        ));
    }

    // 2. Idempotency fast path; the conditional update below closes the
    // remaining race between concurrent duplicates.
    lifecycle::ensure_verifiable(&booking).map_err(ApiError::from_lifecycle)?;

    // The supplied order must be the one created for this booking, otherwise
    // a signature from some other (cheaper) checkout could be replayed here.
    if booking.order_id.as_deref() != Some(req.razorpay_order_id.as_str()) {
        return Err(ApiError::Validation(
            "Order reference does not match booking".to_string(),
        ));
    }

    // 3. Verify the gateway signature. Nothing downstream runs without it.
    let valid = signature::verify_signature(
        &state.payment.key_secret,
        &req.razorpay_order_id,
        &req.razorpay_payment_id,
        &req.razorpay_signature,
    );

    if !valid {
        tracing::warn!("Signature mismatch on booking {}", booking.id);
        let failed = state
            .bookings
            .mark_failed_if_pending(booking.id, "Payment signature verification failed")
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        // Only the caller that actually claimed the failure releases the slot.
        if failed.is_some() {
            if let Ok(Some(spot)) = state.spots.release_slot(booking.parking_spot_id).await {
                state.emit(RealtimeEvent::SlotUpdated(SlotUpdatedEvent {
                    parking_id: spot.id,
                    available_slots: spot.available_slots,
                }));
                refresh_availability_mirror(&state, spot.id, spot.available_slots).await;
            }
        }
        return Err(ApiError::SignatureVerificationFailed);
    }

    // 4. The spot may have been deleted between booking and payment. No slot
    // release in that case: the inventory row is gone with it.
    let spot = match state
        .spots
        .get_spot(booking.parking_spot_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        Some(spot) => spot,
        None => {
            let _ = state
                .bookings
                .mark_failed_if_pending(booking.id, "Parking spot no longer exists")
                .await;
            return Err(ApiError::SpotNoLongerExists);
        }
    };

    // 5. Atomically claim the pending -> confirmed/paid transition
    let confirmed = state
        .bookings
        .mark_confirmed_if_pending(booking.id, &req.razorpay_payment_id, &req.razorpay_signature)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::AlreadyProcessed)?;

    // 6. Commission split, integer math; the owner keeps the remainder
    let split = CommissionSplit::compute(
        confirmed.total_amount,
        state.business_rules.commission_percent,
    );

    // 7. Credit the owner and write both ledger records
    let earning_tx = state
        .ledger
        .credit(
            spot.owner_id,
            split.owner_earnings,
            TransactionType::Earning,
            Some(confirmed.id),
            &format!("Earnings for booking {}", confirmed.booking_code),
            serde_json::json!({ "bookingCode": confirmed.booking_code }),
        )
        .await
        .map_err(|e| {
            tracing::error!("Owner credit failed after payment {}: {}", confirmed.id, e);
            ApiError::Internal(e.to_string())
        })?;

    state
        .ledger
        .record_fee(
            spot.owner_id,
            confirmed.id,
            split.platform_fee,
            &format!("Platform commission for booking {}", confirmed.booking_code),
        )
        .await
        .map_err(|e| {
            tracing::error!("Fee record failed for booking {}: {}", confirmed.id, e);
            ApiError::Internal(e.to_string())
        })?;

    // 8. Best-effort observer updates
    let total_bookings = state
        .bookings
        .count_confirmed_for_spot(spot.id)
        .await
        .unwrap_or(0);

    state.emit(RealtimeEvent::BookingConfirmed(BookingConfirmedEvent {
        booking_id: confirmed.id,
        parking_id: spot.id,
        available_slots: spot.available_slots,
        total_bookings,
    }));
    state.emit(RealtimeEvent::WalletUpdated(WalletUpdatedEvent {
        user_id: spot.owner_id,
        new_balance: earning_tx.balance_after,
    }));

    // 9. Confirmation message, decoupled from the response
    let notifier = state.notifier.clone();
    let notification = BookingNotification {
        booking_code: confirmed.booking_code.clone(),
        user_email: Masked(claims.email.clone()),
        spot_name: spot.name.clone(),
        total_amount: confirmed.total_amount,
        currency: state.payment.currency.clone(),
    };
    tokio::spawn(async move {
        if let Err(e) = notifier.send_booking_confirmation(&notification).await {
            tracing::warn!(
                "Confirmation message failed for {}: {}",
                notification.booking_code,
                e
            );
        }
    });

    tracing::info!(
        "Booking {} confirmed: {} to owner, {} platform fee",
        confirmed.booking_code,
        split.owner_earnings,
        split.platform_fee
    );

    Ok(Json(VerifyPaymentResponse {
        booking: confirmed.into(),
        payment: PaymentSummary {
            amount: split.total_amount,
            owner_earnings: split.owner_earnings,
            platform_fee: split.platform_fee,
        },
    }))
}

/// PUT /bookings/:id/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<BookingEnvelope>, ApiError> {
    let user_id = claims.user_id()?;

    // 1. Load and authorize
    let booking = state
        .bookings
        .get(booking_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    if booking.user_id != user_id {
        return Err(ApiError::Forbidden(
            "You can only cancel your own bookings".to_string(),
        ));
    }

    // 2. Terminal states reject this path
    lifecycle::ensure_cancellable(&booking).map_err(ApiError::from_lifecycle)?;

    let was_paid = booking.payment_status == PaymentStatus::Paid;

    // 3. Conditional cancel; a concurrent cancel loses here
    let mut cancelled = state
        .bookings
        .cancel(booking_id, req.reason.as_deref())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::AlreadyCancelled)?;

    // 4. Give the slot back
    if let Ok(Some(spot)) = state.spots.release_slot(booking.parking_spot_id).await {
        state.emit(RealtimeEvent::SlotUpdated(SlotUpdatedEvent {
            parking_id: spot.id,
            available_slots: spot.available_slots,
        }));
        refresh_availability_mirror(&state, spot.id, spot.available_slots).await;
    }

    // 5. A paid booking also reverses the owner's earning
    if was_paid {
        let earning = state
            .ledger
            .earning_for_booking(booking_id)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .ok_or_else(|| {
                tracing::error!(
                    "Paid booking {} has no earning transaction to reverse",
                    booking_id
                );
                ApiError::Internal("Ledger entry missing for paid booking".to_string())
            })?;

        let refund_tx = state
            .ledger
            .debit(
                earning.user_id,
                earning.amount,
                TransactionType::Refund,
                Some(booking_id),
                &format!("Refund reversal for booking {}", cancelled.booking_code),
                serde_json::json!({ "reason": req.reason }),
            )
            .await
            .map_err(|e| {
                // An uncoverable refund means the books are wrong upstream;
                // surface it loudly instead of swallowing it.
                tracing::error!("Refund debit failed for booking {}: {}", booking_id, e);
                ApiError::Internal(e.to_string())
            })?;

        state
            .bookings
            .set_payment_refunded(booking_id)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        cancelled.payment_status = PaymentStatus::Refunded;

        state.emit(RealtimeEvent::WalletUpdated(WalletUpdatedEvent {
            user_id: refund_tx.user_id,
            new_balance: refund_tx.balance_after,
        }));
    }

    // 6. Cancellation notice, fire-and-forget
    let notifier = state.notifier.clone();
    let notification = BookingNotification {
        booking_code: cancelled.booking_code.clone(),
        user_email: Masked(claims.email.clone()),
        spot_name: String::new(),
        total_amount: cancelled.total_amount,
        currency: state.payment.currency.clone(),
    };
    let reason = req.reason.clone().unwrap_or_default();
    tokio::spawn(async move {
        if let Err(e) = notifier.send_cancellation(&notification, &reason).await {
            tracing::warn!(
                "Cancellation message failed for {}: {}",
                notification.booking_code,
                e
            );
        }
    });

    tracing::info!("Booking {} cancelled", cancelled.booking_code);

    Ok(Json(BookingEnvelope {
        booking: cancelled.into(),
    }))
}

/// GET /bookings/:id
async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingEnvelope>, ApiError> {
    let user_id = claims.user_id()?;

    let booking = state
        .bookings
        .get(booking_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    if booking.user_id != user_id {
        return Err(ApiError::Forbidden(
            "This booking belongs to another user".to_string(),
        ));
    }

    Ok(Json(BookingEnvelope {
        booking: booking.into(),
    }))
}

/// GET /bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<BookingListResponse>, ApiError> {
    let user_id = claims.user_id()?;

    let bookings = state
        .bookings
        .list_for_user(user_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(BookingListResponse {
        bookings: bookings.into_iter().map(Into::into).collect(),
    }))
}

/// Keep the read-side cache in step with the authoritative count. A failed
/// write just means the next availability read re-seeds from the database.
async fn refresh_availability_mirror(state: &AppState, spot_id: Uuid, available: i32) {
    if let Err(e) = state
        .redis
        .set_spot_availability(&spot_id.to_string(), available)
        .await
    {
        tracing::debug!("Availability mirror update failed for {}: {}", spot_id, e);
    }
}
