//! API configuration.
//!
//! Layered with the `config` crate:
//!
//! ```text
//! built-in defaults
//!      ▼ overridden by
//! vantage.toml (optional, working directory)
//!      ▼ overridden by
//! VANTAGE_* environment variables (VANTAGE_PORT=9090, VANTAGE_TAX_RATE_BPS=825)
//! ```

use config::{Config, Environment, File};
use serde::Deserialize;
use vantage_core::validation::validate_tax_rate_bps;
use vantage_core::DEFAULT_TAX_RATE_BPS;

/// API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Sales tax applied to new orders, in basis points
    pub tax_rate_bps: u32,

    /// `tracing` filter used when RUST_LOG is not set
    pub log_filter: String,
}

impl ApiConfig {
    /// Loads from `vantage.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("vantage")
    }

    /// Loads with an explicit config file stem.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("database_path", "./vantage.db")?
            .set_default("max_connections", 5_i64)?
            .set_default("tax_rate_bps", DEFAULT_TAX_RATE_BPS as i64)?
            .set_default("log_filter", "info,vantage=debug,sqlx=warn")?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("VANTAGE").try_parsing(true))
            .build()?;

        let config: ApiConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_tax_rate_bps(self.tax_rate_bps).map_err(|e| ConfigError::InvalidValue {
            field: "tax_rate_bps".to_string(),
            reason: e.to_string(),
        })?;

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = ApiConfig::load_from("does-not-exist").unwrap();

        assert_eq!(config.tax_rate_bps, 1000);
        assert!(config.max_connections >= 1);
        assert!(config.bind_address().ends_with(&config.port.to_string()));
    }
}
