use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;
use uuid::Uuid;

use parkly_api::middleware::auth::CustomerClaims;
use parkly_api::state::{AppState, AuthConfig, PaymentSettings, Resiliency};
use parkly_booking::models::{Booking, BookingStatus, PaymentStatus};
use parkly_booking::{BookingRepository, MockPaymentGateway, PaymentOrchestrator};
use parkly_catalog::spot::ParkingSpot;
use parkly_catalog::SpotRepository;
use parkly_core::events::NoopEventSink;
use parkly_core::notify::LogNotificationSender;
use parkly_core::payment::PaymentGateway;
use parkly_ledger::transaction::{Transaction, TransactionStatus, TransactionType};
use parkly_ledger::{LedgerError, LedgerRepository};
use parkly_store::app_config::BusinessRules;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const GATEWAY_SECRET: &str = "rzp_test_secret";
pub const GATEWAY_KEY_ID: &str = "rzp_test_key";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// In-memory repository fakes
// ============================================================================

#[derive(Default)]
pub struct MemorySpotRepo {
    spots: Mutex<HashMap<Uuid, ParkingSpot>>,
}

impl MemorySpotRepo {
    pub fn insert(&self, spot: ParkingSpot) {
        self.spots.lock().unwrap().insert(spot.id, spot);
    }

    pub fn remove(&self, id: Uuid) {
        self.spots.lock().unwrap().remove(&id);
    }

    pub fn available(&self, id: Uuid) -> i32 {
        self.spots.lock().unwrap()[&id].available_slots
    }
}

#[async_trait]
impl SpotRepository for MemorySpotRepo {
    async fn get_spot(&self, id: Uuid) -> Result<Option<ParkingSpot>, BoxError> {
        Ok(self.spots.lock().unwrap().get(&id).cloned())
    }

    async fn reserve_slot(&self, id: Uuid) -> Result<Option<ParkingSpot>, BoxError> {
        let mut spots = self.spots.lock().unwrap();
        match spots.get_mut(&id) {
            Some(spot) if spot.available_slots > 0 => {
                spot.available_slots -= 1;
                Ok(Some(spot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_slot(&self, id: Uuid) -> Result<Option<ParkingSpot>, BoxError> {
        let mut spots = self.spots.lock().unwrap();
        match spots.get_mut(&id) {
            Some(spot) => {
                spot.available_slots = (spot.available_slots + 1).min(spot.total_slots);
                Ok(Some(spot.clone()))
            }
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MemoryBookingRepo {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl MemoryBookingRepo {
    pub fn get_sync(&self, id: Uuid) -> Option<Booking> {
        self.bookings.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }

    pub fn backdate(&self, id: Uuid, created_at: DateTime<Utc>) {
        if let Some(b) = self.bookings.lock().unwrap().get_mut(&id) {
            b.created_at = created_at;
        }
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<(), BoxError> {
        self.bookings
            .lock()
            .unwrap()
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, BoxError> {
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn set_order_id(&self, id: Uuid, order_id: &str) -> Result<(), BoxError> {
        if let Some(b) = self.bookings.lock().unwrap().get_mut(&id) {
            b.order_id = Some(order_id.to_string());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), BoxError> {
        self.bookings.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn mark_confirmed_if_pending(
        &self,
        id: Uuid,
        payment_id: &str,
        signature: &str,
    ) -> Result<Option<Booking>, BoxError> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if b.payment_status == PaymentStatus::Pending => {
                b.mark_confirmed(payment_id.to_string(), signature.to_string());
                Ok(Some(b.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_failed_if_pending(
        &self,
        id: Uuid,
        reason: &str,
    ) -> Result<Option<Booking>, BoxError> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if b.payment_status == PaymentStatus::Pending => {
                b.mark_failed(reason.to_string());
                Ok(Some(b.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn cancel(&self, id: Uuid, reason: Option<&str>) -> Result<Option<Booking>, BoxError> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if !b.status.is_terminal() => {
                b.mark_cancelled(reason.map(|r| r.to_string()));
                Ok(Some(b.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_payment_refunded(&self, id: Uuid) -> Result<(), BoxError> {
        if let Some(b) = self.bookings.lock().unwrap().get_mut(&id) {
            b.payment_status = PaymentStatus::Refunded;
        }
        Ok(())
    }

    async fn expire_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>, BoxError> {
        let mut bookings = self.bookings.lock().unwrap();
        let mut expired = Vec::new();
        for b in bookings.values_mut() {
            if b.status == BookingStatus::Pending
                && b.payment_status == PaymentStatus::Pending
                && b.created_at < cutoff
            {
                b.mark_failed("payment window expired".to_string());
                expired.push(b.clone());
            }
        }
        Ok(expired)
    }

    async fn count_confirmed_for_spot(&self, spot_id: Uuid) -> Result<i64, BoxError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.parking_spot_id == spot_id && b.status == BookingStatus::Confirmed)
            .count() as i64)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, BoxError> {
        let mut list: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}

#[derive(Default)]
struct LedgerInner {
    balances: HashMap<Uuid, i64>,
    transactions: Vec<Transaction>,
}

#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerInner>,
}

impl MemoryLedger {
    pub fn seed_user(&self, user_id: Uuid, balance: i64) {
        self.inner.lock().unwrap().balances.insert(user_id, balance);
    }

    pub fn balance(&self, user_id: Uuid) -> i64 {
        self.inner.lock().unwrap().balances[&user_id]
    }

    pub fn transactions_for(&self, user_id: Uuid) -> Vec<Transaction> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedger {
    async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        tx_type: TransactionType,
        booking_id: Option<Uuid>,
        description: &str,
        metadata: serde_json::Value,
    ) -> Result<Transaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut inner = self.inner.lock().unwrap();
        let balance = *inner
            .balances
            .get(&user_id)
            .ok_or(LedgerError::UserNotFound(user_id))?;

        let record = Transaction::wallet_mutation(
            user_id,
            booking_id,
            tx_type,
            amount,
            balance,
            TransactionStatus::Completed,
            description.to_string(),
            metadata,
        );
        inner.balances.insert(user_id, record.balance_after);
        inner.transactions.push(record.clone());
        Ok(record)
    }

    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        tx_type: TransactionType,
        booking_id: Option<Uuid>,
        description: &str,
        metadata: serde_json::Value,
    ) -> Result<Transaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut inner = self.inner.lock().unwrap();
        let balance = *inner
            .balances
            .get(&user_id)
            .ok_or(LedgerError::UserNotFound(user_id))?;

        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                available: balance,
                requested: amount,
            });
        }

        let status = if tx_type == TransactionType::WithdrawalRequest {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Completed
        };

        let record = Transaction::wallet_mutation(
            user_id,
            booking_id,
            tx_type,
            -amount,
            balance,
            status,
            description.to_string(),
            metadata,
        );
        inner.balances.insert(user_id, record.balance_after);
        inner.transactions.push(record.clone());
        Ok(record)
    }

    async fn record_fee(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        fee_amount: i64,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        if fee_amount <= 0 {
            return Err(LedgerError::InvalidAmount(fee_amount));
        }
        let mut inner = self.inner.lock().unwrap();
        let balance = *inner
            .balances
            .get(&user_id)
            .ok_or(LedgerError::UserNotFound(user_id))?;

        let record =
            Transaction::platform_fee(user_id, booking_id, fee_amount, balance, description.to_string());
        inner.transactions.push(record.clone());
        Ok(record)
    }

    async fn earning_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<Transaction>, LedgerError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .find(|t| t.booking_id == Some(booking_id) && t.tx_type == TransactionType::Earning)
            .cloned())
    }

    async fn get_balance(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        self.inner
            .lock()
            .unwrap()
            .balances
            .get(&user_id)
            .copied()
            .ok_or(LedgerError::UserNotFound(user_id))
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        let mut list: Vec<Transaction> = self
            .inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}

// ============================================================================
// Test harness
// ============================================================================

pub struct TestContext {
    pub state: AppState,
    pub spots: Arc<MemorySpotRepo>,
    pub bookings: Arc<MemoryBookingRepo>,
    pub ledger: Arc<MemoryLedger>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_gateway(Arc::new(MockPaymentGateway::new())).await
    }

    pub async fn with_failing_gateway() -> Self {
        Self::with_gateway(Arc::new(MockPaymentGateway::failing())).await
    }

    async fn with_gateway(gateway: Arc<dyn PaymentGateway>) -> Self {
        let spots = Arc::new(MemorySpotRepo::default());
        let bookings = Arc::new(MemoryBookingRepo::default());
        let ledger = Arc::new(MemoryLedger::default());

        let redis = parkly_store::RedisClient::new("redis://127.0.0.1:6379")
            .await
            .expect("redis client handle");

        let (realtime_tx, _) = tokio::sync::broadcast::channel(100);

        let state = AppState {
            spots: spots.clone(),
            bookings: bookings.clone(),
            ledger: ledger.clone(),
            payments: Arc::new(PaymentOrchestrator::new(gateway)),
            notifier: Arc::new(LogNotificationSender),
            events: Arc::new(NoopEventSink),
            redis: Arc::new(redis),
            realtime_tx,
            auth: AuthConfig {
                secret: JWT_SECRET.to_string(),
                expiration: 86_400,
            },
            payment: PaymentSettings {
                key_id: GATEWAY_KEY_ID.to_string(),
                key_secret: GATEWAY_SECRET.to_string(),
                currency: "INR".to_string(),
            },
            business_rules: BusinessRules {
                commission_percent: 15,
                max_booking_hours: 72,
                pending_payment_ttl_seconds: 900,
                reaper_interval_seconds: 60,
            },
            resiliency: Arc::new(Resiliency::default()),
        };

        Self {
            state,
            spots,
            bookings,
            ledger,
        }
    }

    pub fn app(&self) -> Router {
        parkly_api::app(self.state.clone())
    }

    /// Spot owned by a fresh, zero-balance owner. Returns (spot_id, owner_id).
    pub fn add_spot(&self, total_slots: i32, price_per_hour: i64) -> (Uuid, Uuid) {
        let owner_id = Uuid::new_v4();
        self.ledger.seed_user(owner_id, 0);
        let spot = ParkingSpot::new(owner_id, "Test Lot".to_string(), total_slots, price_per_hour);
        let spot_id = spot.id;
        self.spots.insert(spot);
        (spot_id, owner_id)
    }
}

pub fn token_for(user_id: Uuid) -> String {
    let claims = CustomerClaims {
        sub: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        role: "CUSTOMER".to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("token encoding")
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, value)
}

pub async fn get_json(
    app: &Router,
    uri: &str,
    token: &str,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}
