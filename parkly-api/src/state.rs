use crate::middleware::resiliency::CircuitBreaker;
use parkly_booking::{BookingRepository, PaymentOrchestrator};
use parkly_catalog::SpotRepository;
use parkly_core::events::EventSink;
use parkly_core::notify::NotificationSender;
use parkly_ledger::LedgerRepository;
use parkly_shared::models::events::RealtimeEvent;
use parkly_store::app_config::BusinessRules;
use parkly_store::RedisClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

/// Gateway credentials the API needs at request time: the public key handed
/// to checkout clients and the shared secret signatures are verified with.
#[derive(Clone)]
pub struct PaymentSettings {
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

pub struct Resiliency {
    pub payment_cb: CircuitBreaker,
}

impl Default for Resiliency {
    fn default() -> Self {
        Self {
            payment_cb: CircuitBreaker::new("payment", 5, Duration::from_secs(30)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub spots: Arc<dyn SpotRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub payments: Arc<PaymentOrchestrator>,
    pub notifier: Arc<dyn NotificationSender>,
    pub events: Arc<dyn EventSink>,
    pub redis: Arc<RedisClient>,
    pub realtime_tx: broadcast::Sender<RealtimeEvent>,
    pub auth: AuthConfig,
    pub payment: PaymentSettings,
    pub business_rules: BusinessRules,
    pub resiliency: Arc<Resiliency>,
}

impl AppState {
    /// Fan an event out to SSE subscribers and, in the background, to the
    /// durable sink. Both sides are best-effort; the caller's transition has
    /// already committed.
    pub fn emit(&self, event: RealtimeEvent) {
        let _ = self.realtime_tx.send(event.clone());

        let sink = self.events.clone();
        tokio::spawn(async move {
            match serde_json::to_string(&event) {
                Ok(payload) => {
                    if let Err(e) = sink.publish(event.topic(), &event.key(), &payload).await {
                        tracing::warn!("Failed to publish {} event: {}", event.topic(), e);
                    }
                }
                Err(e) => tracing::warn!("Failed to serialize {} event: {}", event.topic(), e),
            }
        });
    }
}
