use uuid::Uuid;

/// Broadcast after a successful payment verification.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub parking_id: Uuid,
    pub available_slots: i32,
    pub total_bookings: i64,
}

/// Broadcast on any slot-count change outside the confirm path (cancellation,
/// reaper release, failed verification).
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SlotUpdatedEvent {
    pub parking_id: Uuid,
    pub available_slots: i32,
}

/// Broadcast on any wallet mutation.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdatedEvent {
    pub user_id: Uuid,
    pub new_balance: i64,
}

/// Envelope carried on the in-process broadcast channel and fanned out over
/// SSE. The wire name of each variant is the SSE event name.
#[derive(Debug, serde::Serialize, Clone)]
#[serde(untagged)]
pub enum RealtimeEvent {
    BookingConfirmed(BookingConfirmedEvent),
    SlotUpdated(SlotUpdatedEvent),
    WalletUpdated(WalletUpdatedEvent),
}

impl RealtimeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::BookingConfirmed(_) => "bookingConfirmed",
            RealtimeEvent::SlotUpdated(_) => "slotUpdated",
            RealtimeEvent::WalletUpdated(_) => "walletUpdated",
        }
    }

    /// Kafka topic for the durable side of the same event.
    pub fn topic(&self) -> &'static str {
        match self {
            RealtimeEvent::BookingConfirmed(_) => "booking.confirmed",
            RealtimeEvent::SlotUpdated(_) => "slot.updated",
            RealtimeEvent::WalletUpdated(_) => "wallet.updated",
        }
    }

    pub fn key(&self) -> String {
        match self {
            RealtimeEvent::BookingConfirmed(e) => e.booking_id.to_string(),
            RealtimeEvent::SlotUpdated(e) => e.parking_id.to_string(),
            RealtimeEvent::WalletUpdated(e) => e.user_id.to_string(),
        }
    }
}
