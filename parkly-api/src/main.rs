use parkly_api::{
    app,
    state::{AppState, AuthConfig, PaymentSettings, Resiliency},
};
use parkly_booking::PaymentOrchestrator;
use parkly_core::notify::LogNotificationSender;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkly_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = parkly_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Parkly API on port {}", config.server.port);

    // Postgres Connection + migrations
    let db = parkly_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Business rules: config defaults, overridable from the database
    let business_rules = match db.fetch_business_rules(config.business_rules.clone()).await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::warn!("Could not load business rule overrides: {}", e);
            config.business_rules.clone()
        }
    };

    // Redis Connection
    let redis_client = parkly_store::RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis_arc = Arc::new(redis_client);

    // Kafka Connection
    let kafka_producer = parkly_store::EventProducer::new(&config.kafka.brokers)
        .expect("Failed to create Kafka producer");

    // Payment gateway
    let gateway = parkly_store::RazorpayGateway::new(
        config.payment.key_id.clone(),
        config.payment.key_secret.clone(),
        config.payment.base_url.clone(),
    );

    // SSE Broadcast Channel
    let (realtime_tx, _) = tokio::sync::broadcast::channel(100);

    let app_state = AppState {
        spots: Arc::new(parkly_store::PgSpotRepository::new(db.pool.clone())),
        bookings: Arc::new(parkly_store::PgBookingRepository::new(db.pool.clone())),
        ledger: Arc::new(parkly_store::PgLedgerRepository::new(db.pool.clone())),
        payments: Arc::new(PaymentOrchestrator::new(Arc::new(gateway))),
        notifier: Arc::new(LogNotificationSender),
        events: Arc::new(kafka_producer),
        redis: redis_arc,
        realtime_tx,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        payment: PaymentSettings {
            key_id: config.payment.key_id.clone(),
            key_secret: config.payment.key_secret.clone(),
            currency: config.payment.currency.clone(),
        },
        business_rules,
        resiliency: Arc::new(Resiliency::default()),
    };

    // Background reaper for checkouts that never completed payment
    tokio::spawn(parkly_api::worker::start_pending_booking_reaper(
        app_state.clone(),
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
