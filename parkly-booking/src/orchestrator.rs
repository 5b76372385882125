use chrono::Utc;
use parkly_core::payment::{GatewayOrder, PaymentGateway};
use std::sync::Arc;
use uuid::Uuid;

/// Single entry point to the external payment gateway. Amounts inside the
/// engine are major currency units; the gateway contract is minor units, and
/// this is the only place that conversion happens.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn create_order(
        &self,
        total_amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, Box<dyn std::error::Error + Send + Sync>> {
        self.gateway
            .create_order(total_amount * 100, currency, receipt)
            .await
    }
}

/// In-process gateway stand-in. `failing()` builds one that refuses order
/// creation, for exercising the compensation path.
pub struct MockPaymentGateway {
    fail: bool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, Box<dyn std::error::Error + Send + Sync>> {
        if self.fail {
            return Err("Simulated payment gateway failure".into());
        }

        Ok(GatewayOrder {
            id: format!("order_{}", Uuid::new_v4().simple()),
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_orchestrator_converts_to_minor_units() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(MockPaymentGateway::new()));
        let order = orchestrator.create_order(200, "INR", "PKY-TEST").await.unwrap();
        assert_eq!(order.amount, 20_000);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.receipt, "PKY-TEST");
        assert!(order.id.starts_with("order_"));
    }

    #[tokio::test]
    async fn test_failing_gateway_surfaces_error() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(MockPaymentGateway::failing()));
        let result = orchestrator.create_order(200, "INR", "PKY-TEST").await;
        assert!(result.is_err());
    }
}
