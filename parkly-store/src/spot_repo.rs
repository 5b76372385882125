use async_trait::async_trait;
use parkly_catalog::spot::ParkingSpot;
use parkly_catalog::SpotRepository;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const SPOT_COLUMNS: &str =
    "id, owner_id, name, total_slots, available_slots, price_per_hour, is_active, created_at, updated_at";

pub struct PgSpotRepository {
    pool: PgPool,
}

impl PgSpotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn spot_from_row(row: &PgRow) -> Result<ParkingSpot, sqlx::Error> {
    Ok(ParkingSpot {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        total_slots: row.try_get("total_slots")?,
        available_slots: row.try_get("available_slots")?,
        price_per_hour: row.try_get("price_per_hour")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl SpotRepository for PgSpotRepository {
    async fn get_spot(
        &self,
        id: Uuid,
    ) -> Result<Option<ParkingSpot>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!("SELECT {SPOT_COLUMNS} FROM parking_spots WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(spot_from_row).transpose().map_err(Into::into)
    }

    async fn reserve_slot(
        &self,
        id: Uuid,
    ) -> Result<Option<ParkingSpot>, Box<dyn std::error::Error + Send + Sync>> {
        // Single conditional decrement. Two concurrent requests for the last
        // slot serialize here; the loser matches zero rows.
        let sql = format!(
            "UPDATE parking_spots
             SET available_slots = available_slots - 1, updated_at = NOW()
             WHERE id = $1 AND available_slots > 0
             RETURNING {SPOT_COLUMNS}"
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(spot_from_row).transpose().map_err(Into::into)
    }

    async fn release_slot(
        &self,
        id: Uuid,
    ) -> Result<Option<ParkingSpot>, Box<dyn std::error::Error + Send + Sync>> {
        // LEAST keeps the capacity invariant even if a release is replayed.
        let sql = format!(
            "UPDATE parking_spots
             SET available_slots = LEAST(available_slots + 1, total_slots), updated_at = NOW()
             WHERE id = $1
             RETURNING {SPOT_COLUMNS}"
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(spot_from_row).transpose().map_err(Into::into)
    }
}
