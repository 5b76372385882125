use chrono::{Duration as ChronoDuration, Utc};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::state::AppState;
use parkly_shared::models::events::{RealtimeEvent, SlotUpdatedEvent};

/// Background sweep for checkouts that never completed payment. A pending
/// booking holds a reserved slot; past the TTL it is failed and the slot
/// goes back into inventory. The sweep claims bookings with the same
/// pending-only conditional update the verifier uses, so a payment landing
/// mid-sweep always wins.
pub async fn start_pending_booking_reaper(state: AppState) {
    let interval = Duration::from_secs(state.business_rules.reaper_interval_seconds);
    let ttl = ChronoDuration::seconds(state.business_rules.pending_payment_ttl_seconds as i64);

    info!(
        "Pending-booking reaper started (ttl {}s, every {}s)",
        state.business_rules.pending_payment_ttl_seconds,
        state.business_rules.reaper_interval_seconds
    );

    loop {
        sleep(interval).await;

        let cutoff = Utc::now() - ttl;
        let expired = match state.bookings.expire_stale_pending(cutoff).await {
            Ok(expired) => expired,
            Err(e) => {
                error!("Reaper sweep failed: {}", e);
                continue;
            }
        };

        if expired.is_empty() {
            continue;
        }

        info!("Reaper expired {} stale pending bookings", expired.len());

        for booking in expired {
            match state.spots.release_slot(booking.parking_spot_id).await {
                Ok(Some(spot)) => {
                    state.emit(RealtimeEvent::SlotUpdated(SlotUpdatedEvent {
                        parking_id: spot.id,
                        available_slots: spot.available_slots,
                    }));
                }
                Ok(None) => {
                    // Spot deleted while the booking was pending; nothing to
                    // release.
                }
                Err(e) => {
                    error!(
                        "Failed to release slot for expired booking {}: {}",
                        booking.id, e
                    );
                }
            }
        }
    }
}
