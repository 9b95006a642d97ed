use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    /// Opens the pool. While Postgres is still starting up the connection is
    /// retried, up to `connect_attempts` tries in total.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let mut attempt = 1;
        loop {
            match pool_options(config).connect(&config.url).await {
                Ok(pool) => {
                    info!(attempt, pool_size = config.pool_size, "Connected to database");
                    return Ok(Database { pool });
                }
                Err(e) if attempt < config.connect_attempts => {
                    warn!(attempt, error = %e, "Database is not ready, retrying");
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(config.connect_retry_millis)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wraps an existing pool, e.g. a lazy one that never connects.
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Database { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed");
        Ok(())
    }
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
}
