use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay business-rule overrides from the database onto the config
    /// defaults. Rows are `{"value": <number>}` keyed by rule name.
    pub async fn fetch_business_rules(
        &self,
        defaults: crate::app_config::BusinessRules,
    ) -> Result<crate::app_config::BusinessRules, sqlx::Error> {
        let rows = sqlx::query("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;

        for row in rows {
            let key: String = row.try_get("rule_key")?;
            let val: serde_json::Value = row.try_get("rule_value")?;

            if let Some(v) = val.get("value") {
                match key.as_str() {
                    "commission_percent" => {
                        if let Some(n) = v.as_i64() {
                            rules.commission_percent = n;
                        }
                    }
                    "max_booking_hours" => {
                        if let Some(n) = v.as_i64() {
                            rules.max_booking_hours = n;
                        }
                    }
                    "pending_payment_ttl_seconds" => {
                        if let Some(n) = v.as_u64() {
                            rules.pending_payment_ttl_seconds = n;
                        }
                    }
                    "reaper_interval_seconds" => {
                        if let Some(n) = v.as_u64() {
                            rules.reaper_interval_seconds = n;
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(rules)
    }
}
