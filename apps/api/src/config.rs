//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                    | Default                  |
//! |-----------------------------|--------------------------|
//! | `HOST`                      | `0.0.0.0`                |
//! | `PORT`                      | `3000`                   |
//! | `DATABASE_PATH`             | `./ventas.db`            |
//! | `DB_MAX_CONNECTIONS`        | `5`                      |
//! | `JWT_SECRET`                | dev secret (refused in production) |
//! | `JWT_ISSUER`                | `ventas-api`             |
//! | `JWT_AUDIENCE`              | `ventas-clients`         |
//! | `JWT_ACCESS_LIFETIME_SECS`  | `3600`                   |
//! | `JWT_REFRESH_LIFETIME_SECS` | `604800`                 |
//! | `FIELD_ENCRYPTION_KEY`      | dev key (refused in production) |
//! | `ORDER_CANCELLATION_POLICY` | `legacy`                 |
//! | `LOW_STOCK_THRESHOLD`       | `10`                     |
//! | `APP_ENV`                   | `development`            |

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use ventas_core::CancellationPolicy;

const DEV_JWT_SECRET: &str = "ventas-dev-secret-change-in-production";
const DEV_FIELD_KEY: &str = "ventas-dev-field-key-change-in-production";

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file (`:memory:` for an in-memory database)
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// `iss` claim written and required
    pub jwt_issuer: String,

    /// `aud` claim written and required
    pub jwt_audience: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// Secret the order-notes key is derived from
    pub field_encryption_key: String,

    /// Whether shipped orders can be cancelled
    pub cancellation_policy: CancellationPolicy,

    /// Products at or below this stock count as low
    pub low_stock_threshold: i64,

    /// `production` turns missing secrets into errors
    pub environment: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = environment.eq_ignore_ascii_case("production");

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::MissingRequired("JWT_SECRET".to_string())),
            None => DEV_JWT_SECRET.to_string(),
        };

        let field_encryption_key = match lookup("FIELD_ENCRYPTION_KEY") {
            Some(key) => key,
            None if production => {
                return Err(ConfigError::MissingRequired(
                    "FIELD_ENCRYPTION_KEY".to_string(),
                ))
            }
            None => DEV_FIELD_KEY.to_string(),
        };

        let config = ApiConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse(&lookup, "PORT", "3000")?,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "./ventas.db".to_string()),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", "5")?,
            jwt_secret,
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "ventas-api".to_string()),
            jwt_audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "ventas-clients".to_string()),
            jwt_access_lifetime_secs: parse(&lookup, "JWT_ACCESS_LIFETIME_SECS", "3600")?, // 1 hour
            jwt_refresh_lifetime_secs: parse(&lookup, "JWT_REFRESH_LIFETIME_SECS", "604800")?, // 7 days
            field_encryption_key,
            cancellation_policy: parse(&lookup, "ORDER_CANCELLATION_POLICY", "legacy")?,
            low_stock_threshold: parse(&lookup, "LOW_STOCK_THRESHOLD", "10")?,
            environment,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()));
        }
        if config.jwt_refresh_lifetime_secs <= config.jwt_access_lifetime_secs {
            return Err(ConfigError::InvalidValue("JWT_REFRESH_LIFETIME_SECS".to_string()));
        }
        if production && config.jwt_secret.len() < 32 {
            return Err(ConfigError::WeakSecret("JWT_SECRET".to_string()));
        }

        Ok(config)
    }

    /// Address to bind, `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the server runs with production rules.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Default for ApiConfig {
    /// Development defaults, as if no variable were set.
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_path: "./ventas.db".to_string(),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_issuer: "ventas-api".to_string(),
            jwt_audience: "ventas-clients".to_string(),
            jwt_access_lifetime_secs: 3600,
            jwt_refresh_lifetime_secs: 604_800,
            field_encryption_key: DEV_FIELD_KEY.to_string(),
            cancellation_policy: CancellationPolicy::Legacy,
            low_stock_threshold: 10,
            environment: "development".to_string(),
        }
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("{0} must be at least 32 characters in production")]
    WeakSecret(String),
}
