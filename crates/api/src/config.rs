//! Service configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

/// Default listen port of the stock service.
pub const STOCK_SERVICE_PORT: u16 = 8080;
/// Default listen port of the order service.
pub const ORDER_SERVICE_PORT: u16 = 8081;

const DEFAULT_STOCK_SERVICE_URL: &str = "http://localhost:8080";
const DEFAULT_STOCK_SERVICE_TIMEOUT_SECS: u64 = 5;

/// A variable was set to something unusable.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {name}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration of either service, read once at startup.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default depends on the service)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default `text`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory storage when unset
/// - `STOCK_SERVICE_URL`: where the order service reaches the stock service
/// - `STOCK_SERVICE_TIMEOUT_SECS`: per-call timeout for that (default 5)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub stock_service_url: String,
    pub stock_service_timeout: Duration,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        Self::from_lookup(default_port, |name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// unset or blank variables.
    pub fn from_lookup(
        default_port: u16,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(value) => parse("PORT", value)?,
            None => default_port,
        };

        let log_format = match var("LOG_FORMAT") {
            None => LogFormat::Text,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError {
                        name: "LOG_FORMAT",
                        value,
                    });
                }
            },
        };

        let timeout_secs = match var("STOCK_SERVICE_TIMEOUT_SECS") {
            Some(value) => parse("STOCK_SERVICE_TIMEOUT_SECS", value)?,
            None => DEFAULT_STOCK_SERVICE_TIMEOUT_SECS,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format,
            database_url: var("DATABASE_URL"),
            stock_service_url: var("STOCK_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_STOCK_SERVICE_URL.to_string()),
            stock_service_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError { name, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(default_port: u16, vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(default_port, |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(STOCK_SERVICE_PORT, &[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert_eq!(config.stock_service_url, "http://localhost:8080");
        assert_eq!(config.stock_service_timeout, Duration::from_secs(5));
    }

    #[test]
    fn order_service_port_default() {
        let config = load(ORDER_SERVICE_PORT, &[]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8081");
    }

    #[test]
    fn overrides() {
        let config = load(
            STOCK_SERVICE_PORT,
            &[
                ("HOST", "127.0.0.1"),
                ("PORT", "9000"),
                ("LOG_FORMAT", "JSON"),
                ("DATABASE_URL", "postgres://localhost/stock"),
                ("STOCK_SERVICE_URL", "http://stock:8080"),
                ("STOCK_SERVICE_TIMEOUT_SECS", "2"),
            ],
        )
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/stock")
        );
        assert_eq!(config.stock_service_url, "http://stock:8080");
        assert_eq!(config.stock_service_timeout, Duration::from_secs(2));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(STOCK_SERVICE_PORT, &[("PORT", " "), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = load(STOCK_SERVICE_PORT, &[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.name, "PORT");

        let err = load(STOCK_SERVICE_PORT, &[("LOG_FORMAT", "xml")]).unwrap_err();
        assert_eq!(err.to_string(), r#"invalid value "xml" for LOG_FORMAT"#);
    }
}
