use config::{ConfigError, Environment};
use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_seconds: u64,
    /// Tries to open the pool at startup, at least one.
    pub connect_attempts: u32,
    pub connect_retry_millis: u64,
}

// Настройки бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Seat every section group of a booking side by side in one row.
    pub contiguous_seats: bool,
}

impl Config {
    /// Reads `APP__*`, `DATABASE__*` and `BOOKING__*` variables on top of the
    /// defaults. `DATABASE_URL` wins over `DATABASE__URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default(), env::var("DATABASE_URL").ok())
    }

    pub fn load(source: Environment, database_url: Option<String>) -> Result<Self, ConfigError> {
        config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "ticketmonster=debug,tower_http=debug")?
            .set_default("app.log_format", "pretty")?
            .set_default("database.pool_size", 20)?
            .set_default("database.acquire_timeout_seconds", 5)?
            .set_default("database.connect_attempts", 10)?
            .set_default("database.connect_retry_millis", 500)?
            .set_default("booking.contiguous_seats", true)?
            .add_source(source.separator("__").try_parsing(true))
            .set_override_option("database.url", database_url)?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::default().source(Some(map))
    }

    #[test]
    fn defaults_apply_when_only_the_url_is_set() {
        let config = Config::load(vars(&[]), Some("postgres://localhost/ticketmonster".into())).unwrap();
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.app.log_format, LogFormat::Pretty);
        assert_eq!(config.database.pool_size, 20);
        assert_eq!(config.database.connect_attempts, 10);
        assert!(config.booking.contiguous_seats);
    }

    #[test]
    fn nested_variables_override_defaults() {
        let config = Config::load(
            vars(&[
                ("APP__PORT", "9090"),
                ("APP__LOG_FORMAT", "json"),
                ("DATABASE__URL", "postgres://db/tm"),
                ("BOOKING__CONTIGUOUS_SEATS", "false"),
                ("DATABASE__CONNECT_ATTEMPTS", "30"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(config.app.port, 9090);
        assert_eq!(config.app.log_format, LogFormat::Json);
        assert_eq!(config.database.url, "postgres://db/tm");
        assert!(!config.booking.contiguous_seats);
        assert_eq!(config.database.connect_attempts, 30);
    }

    #[test]
    fn database_url_is_required() {
        assert!(Config::load(vars(&[]), None).is_err());
    }
}
