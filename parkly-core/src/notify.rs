use async_trait::async_trait;
use parkly_shared::pii::Masked;

/// Context handed to the messaging collaborator when a booking is confirmed
/// or cancelled. Kept flat so implementations can template it directly. The
/// recipient address is masked in Debug/log output; real senders unwrap it.
#[derive(Debug, Clone)]
pub struct BookingNotification {
    pub booking_code: String,
    pub user_email: Masked<String>,
    pub spot_name: String,
    pub total_amount: i64,
    pub currency: String,
}

/// Outbound messaging seam (email/SMS). Callers dispatch through a spawned
/// task and only log failures; a send error must never fail a request whose
/// payment has already been finalized.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_booking_confirmation(
        &self,
        notification: &BookingNotification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn send_cancellation(
        &self,
        notification: &BookingNotification,
        reason: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Default sender that records the message in the logs. The real mailer is a
/// deployment concern wired in at startup.
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send_booking_confirmation(
        &self,
        notification: &BookingNotification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(
            "Booking confirmation for {} ({} {}) -> {}",
            notification.booking_code,
            notification.total_amount,
            notification.currency,
            notification.user_email
        );
        Ok(())
    }

    async fn send_cancellation(
        &self,
        notification: &BookingNotification,
        reason: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(
            "Cancellation notice for {} ({}) -> {}",
            notification.booking_code,
            reason,
            notification.user_email
        );
        Ok(())
    }
}
