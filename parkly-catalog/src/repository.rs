use crate::spot::ParkingSpot;
use async_trait::async_trait;
use uuid::Uuid;

/// Data access for parking spots, including the slot reservation guard.
///
/// `reserve_slot` and `release_slot` are the only sanctioned mutations of
/// `available_slots`; both must be single atomic updates in the backing
/// store, never read-then-write.
#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn get_spot(
        &self,
        id: Uuid,
    ) -> Result<Option<ParkingSpot>, Box<dyn std::error::Error + Send + Sync>>;

    /// Atomic "decrement if greater than zero". Returns the post-update spot,
    /// or `None` when no slot was free (the SlotUnavailable signal).
    async fn reserve_slot(
        &self,
        id: Uuid,
    ) -> Result<Option<ParkingSpot>, Box<dyn std::error::Error + Send + Sync>>;

    /// Compensating increment, clamped to capacity. Returns the post-update
    /// spot, or `None` if the spot no longer exists.
    async fn release_slot(
        &self,
        id: Uuid,
    ) -> Result<Option<ParkingSpot>, Box<dyn std::error::Error + Send + Sync>>;
}
