//! Cart store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GOMARKET_STORAGE_KEY` - Key the cart is persisted under (default: `@GoMarket:Products`)
//! - `GOMARKET_WRITE_TIMEOUT_MS` - Upper bound on a single storage write (default: 5000)

use std::time::Duration;

use thiserror::Error;

/// Key the cart list is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarket:Products";

const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Storage key holding the serialized cart
    pub storage_key: String,
    /// Maximum time a single storage write may take before it is abandoned
    pub write_timeout: Duration,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_key = lookup("GOMARKET_STORAGE_KEY")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        let write_timeout_ms = match lookup("GOMARKET_WRITE_TIMEOUT_MS") {
            Some(raw) => parse_positive_ms("GOMARKET_WRITE_TIMEOUT_MS", &raw)?,
            None => DEFAULT_WRITE_TIMEOUT_MS,
        };

        Ok(Self {
            storage_key,
            write_timeout: Duration::from_millis(write_timeout_ms),
        })
    }
}

fn parse_positive_ms(key: &str, raw: &str) -> Result<u64, ConfigError> {
    let ms = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if ms == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(ms)
}

/// Get an environment variable or fall back to `default`.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional environment variable, treating empty values as unset.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
