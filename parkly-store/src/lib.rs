pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod ledger_repo;
pub mod razorpay;
pub mod redis_repo;
pub mod spot_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use ledger_repo::PgLedgerRepository;
pub use razorpay::RazorpayGateway;
pub use redis_repo::RedisClient;
pub use spot_repo::PgSpotRepository;
