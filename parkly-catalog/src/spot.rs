use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable parking spot. `available_slots` is the live inventory counter
/// mutated by the reservation guard; `total_slots` is the fixed capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub total_slots: i32,
    pub available_slots: i32,
    /// Major currency units per hour.
    pub price_per_hour: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingSpot {
    pub fn new(owner_id: Uuid, name: String, total_slots: i32, price_per_hour: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            total_slots,
            available_slots: total_slots,
            price_per_hour,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Invariant: 0 <= available_slots <= total_slots. Any write that would
    /// exceed capacity is corrected downward.
    pub fn clamp_available(&mut self) {
        if self.available_slots > self.total_slots {
            self.available_slots = self.total_slots;
        }
        if self.available_slots < 0 {
            self.available_slots = 0;
        }
        self.updated_at = Utc::now();
    }

    /// A spot accepts new bookings only while active with free capacity.
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.available_slots > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_spot_starts_full() {
        let spot = ParkingSpot::new(Uuid::new_v4(), "Lot A".to_string(), 12, 100);
        assert_eq!(spot.available_slots, 12);
        assert!(spot.is_bookable());
    }

    #[test]
    fn test_clamp_corrects_overflow_downward() {
        let mut spot = ParkingSpot::new(Uuid::new_v4(), "Lot A".to_string(), 5, 100);
        spot.available_slots = 9;
        spot.clamp_available();
        assert_eq!(spot.available_slots, 5);

        spot.available_slots = -2;
        spot.clamp_available();
        assert_eq!(spot.available_slots, 0);
    }

    #[test]
    fn test_inactive_spot_not_bookable() {
        let mut spot = ParkingSpot::new(Uuid::new_v4(), "Lot A".to_string(), 5, 100);
        spot.is_active = false;
        assert!(!spot.is_bookable());

        spot.is_active = true;
        spot.available_slots = 0;
        assert!(!spot.is_bookable());
    }
}
