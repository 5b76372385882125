use async_trait::async_trait;
use chrono::Utc;
use parkly_core::payment::{GatewayOrder, PaymentGateway};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.razorpay.com";

/// HTTP client for the Razorpay Orders API. Only order creation is needed
/// here; payment capture happens on the client and is proven back to us via
/// the webhook-style signature the verifier checks.
pub struct RazorpayGateway {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    base_url: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String, base_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
    receipt: Option<String>,
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/v1/orders", self.base_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount,
                currency,
                receipt,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Gateway order creation failed: {} {}", status, body);
            return Err(format!("Gateway returned {status}").into());
        }

        let order: CreateOrderResponse = response.json().await?;

        Ok(GatewayOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or_else(|| receipt.to_string()),
            created_at: Utc::now(),
        })
    }
}
