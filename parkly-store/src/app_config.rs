use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Percentage of each paid booking retained by the platform.
    #[serde(default = "default_commission")]
    pub commission_percent: i64,
    /// Longest bookable window.
    #[serde(default = "default_max_hours")]
    pub max_booking_hours: i64,
    /// How long a pending booking may hold a slot before the reaper
    /// releases it.
    #[serde(default = "default_pending_ttl")]
    pub pending_payment_ttl_seconds: u64,
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_seconds: u64,
}

fn default_commission() -> i64 {
    15
}
fn default_max_hours() -> i64 {
    72
}
fn default_pending_ttl() -> u64 {
    900
}
fn default_reaper_interval() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// Public checkout key handed to clients alongside a created order.
    pub key_id: String,
    /// Shared secret for order creation auth and signature verification.
    pub key_secret: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Override for the provider's API host; tests point this at a stub.
    pub base_url: Option<String>,
}

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of PARKLY)
            // Eg.. `PARKLY_SERVER__PORT=9000` would set the server port
            .add_source(config::Environment::with_prefix("PARKLY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
