use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub parking_id: Uuid,
    pub available_slots: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/spots/{id}/availability", get(get_availability))
}

/// GET /spots/:id/availability
/// Live slot count for a spot. Served from the Redis mirror when warm,
/// seeded from the database otherwise.
async fn get_availability(
    State(state): State<AppState>,
    Path(spot_id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    if let Ok(Some(cached)) = state.redis.get_spot_availability(&spot_id.to_string()).await {
        return Ok(Json(AvailabilityResponse {
            parking_id: spot_id,
            available_slots: cached,
        }));
    }

    let spot = state
        .spots
        .get_spot(spot_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Parking spot not found".to_string()))?;

    if let Err(e) = state
        .redis
        .set_spot_availability(&spot_id.to_string(), spot.available_slots)
        .await
    {
        tracing::debug!("Availability mirror seed failed for {}: {}", spot_id, e);
    }

    Ok(Json(AvailabilityResponse {
        parking_id: spot.id,
        available_slots: spot.available_slots,
    }))
}
