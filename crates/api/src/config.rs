use std::time::Duration;

use citizen_db::data_manager::{CacheTtls, DataManagerConfig};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Deadline for every document store operation in milliseconds (default: `5000`).
    pub store_timeout_ms: u64,
    /// Fixed quarantine window in hours (default: `4320`, 180 days).
    pub phone_quarantine_ttl_hours: i64,
    pub user_config_cache_ttl_secs: u64,
    pub phone_mapping_cache_ttl_secs: u64,
    pub category_cache_ttl_secs: u64,
    pub citizen_cache_ttl_secs: u64,
    /// Upper bound on in-process cache entries (default: `100000`).
    pub cache_max_capacity: u64,
    /// Insert the default category catalog at startup (default: `false`).
    pub seed_notification_categories: bool,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                    |
    /// |--------------------------------|----------------------------|
    /// | `HOST`                         | `0.0.0.0`                  |
    /// | `PORT`                         | `3000`                     |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                       |
    /// | `STORE_TIMEOUT_MS`             | `5000`                     |
    /// | `PHONE_QUARANTINE_TTL_HOURS`   | `4320`                     |
    /// | `USER_CONFIG_CACHE_TTL_SECS`   | `3600`                     |
    /// | `PHONE_MAPPING_CACHE_TTL_SECS` | `3600`                     |
    /// | `CATEGORY_CACHE_TTL_SECS`      | `3600`                     |
    /// | `CITIZEN_CACHE_TTL_SECS`       | `10800`                    |
    /// | `CACHE_MAX_CAPACITY`           | `100000`                   |
    /// | `SEED_NOTIFICATION_CATEGORIES` | `false`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let store_timeout_ms: u64 = std::env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("STORE_TIMEOUT_MS must be a valid u64");

        let phone_quarantine_ttl_hours: i64 = std::env::var("PHONE_QUARANTINE_TTL_HOURS")
            .unwrap_or_else(|_| "4320".into())
            .parse()
            .expect("PHONE_QUARANTINE_TTL_HOURS must be a valid i64");

        let user_config_cache_ttl_secs: u64 = std::env::var("USER_CONFIG_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("USER_CONFIG_CACHE_TTL_SECS must be a valid u64");

        let phone_mapping_cache_ttl_secs: u64 = std::env::var("PHONE_MAPPING_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("PHONE_MAPPING_CACHE_TTL_SECS must be a valid u64");

        let category_cache_ttl_secs: u64 = std::env::var("CATEGORY_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("CATEGORY_CACHE_TTL_SECS must be a valid u64");

        let citizen_cache_ttl_secs: u64 = std::env::var("CITIZEN_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "10800".into())
            .parse()
            .expect("CITIZEN_CACHE_TTL_SECS must be a valid u64");

        let cache_max_capacity: u64 = std::env::var("CACHE_MAX_CAPACITY")
            .unwrap_or_else(|_| "100000".into())
            .parse()
            .expect("CACHE_MAX_CAPACITY must be a valid u64");

        let seed_notification_categories: bool = std::env::var("SEED_NOTIFICATION_CATEGORIES")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("SEED_NOTIFICATION_CATEGORIES must be true or false");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store_timeout_ms,
            phone_quarantine_ttl_hours,
            user_config_cache_ttl_secs,
            phone_mapping_cache_ttl_secs,
            category_cache_ttl_secs,
            citizen_cache_ttl_secs,
            cache_max_capacity,
            seed_notification_categories,
            jwt,
        }
    }

    /// Store deadline and per-collection cache TTLs for the data manager.
    pub fn data_manager_config(&self) -> DataManagerConfig {
        DataManagerConfig {
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            ttls: CacheTtls {
                phone_mapping: Duration::from_secs(self.phone_mapping_cache_ttl_secs),
                user_config: Duration::from_secs(self.user_config_cache_ttl_secs),
                notification_categories: Duration::from_secs(self.category_cache_ttl_secs),
                citizens: Duration::from_secs(self.citizen_cache_ttl_secs),
            },
        }
    }

    pub fn quarantine_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.phone_quarantine_ttl_hours)
    }
}
