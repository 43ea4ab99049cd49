//! API server configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `shopbill.toml` in the working directory, then environment variables.
//!
//! ## Environment
//! - `HTTP_PORT` - listen port (default: 8000)
//! - `DATABASE_PATH` - SQLite file (default: ./shopbill.db)
//! - `JWT_SECRET` - HS256 signing secret
//! - `JWT_ACCESS_LIFETIME_SECS` - access token lifetime (default: 86400)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `MAX_UPLOAD_BYTES` - import upload limit (default: 10 MiB)

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

const DEV_SECRET: &str = "shopbill-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub http_port: u16,

    pub database_path: String,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    pub db_max_connections: u32,

    /// Largest accepted request body for `POST /import-products`
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8000,
            database_path: "./shopbill.db".to_string(),
            jwt_secret: DEV_SECRET.to_string(),
            jwt_access_lifetime_secs: 86_400,
            db_max_connections: 5,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Loads defaults, then `shopbill.toml` if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config: ApiConfig = Config::builder()
            .set_default("http_port", defaults.http_port as i64)?
            .set_default("database_path", defaults.database_path)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_access_lifetime_secs", defaults.jwt_access_lifetime_secs)?
            .set_default("db_max_connections", defaults.db_max_connections as i64)?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as i64)?
            .add_source(File::with_name("shopbill").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;

        if config.jwt_secret == DEV_SECRET {
            tracing::warn!("JWT_SECRET not set, using the development secret");
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port == 0 {
            return Err(ConfigError::InvalidValue("HTTP_PORT".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("DATABASE_PATH".to_string()));
        }
        if self.jwt_secret.len() < 16 {
            return Err(ConfigError::InvalidValue("JWT_SECRET".to_string()));
        }
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string()));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}
