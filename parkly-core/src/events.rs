use async_trait::async_trait;

/// Durable event publisher seam. The production implementation is the Kafka
/// producer in the store crate; callers treat publishes as best-effort.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Sink that drops events, for environments without a broker.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        _payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!("Event sink disabled, dropping {} for {}", topic, key);
        Ok(())
    }
}
