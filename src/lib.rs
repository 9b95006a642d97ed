pub mod config;
pub mod controllers;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;
pub mod validation;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub services: services::Services,
}

impl AppState {
    /// Connects to the database and runs pending migrations.
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database).await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;

        Ok(Self::from_database(db, config))
    }

    pub fn from_database(db: database::Database, config: config::Config) -> Arc<Self> {
        let services = services::Services::new(db.pool.clone(), &config);
        Arc::new(Self {
            db,
            config,
            services,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/rest", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
