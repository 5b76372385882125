use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An order registered with the external payment gateway. `amount` is in
/// minor currency units, the unit the gateway contract speaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String, // Provider's ID (e.g., order_Nxw1...)
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register an order with the provider before checkout.
    /// `amount` is in minor currency units.
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, Box<dyn std::error::Error + Send + Sync>>;
}
