//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GOMARKET_STORAGE_PATH` - JSON file holding persisted state (default: `.gomarket/storage.json`)
//! - `GOMARKET_STORAGE_KEY` - Key the cart is persisted under (default: `@GoMarket:Products`)
//! - `GOMARKET_WRITE_TIMEOUT_MS` - Upper bound on a single storage write (default: 5000)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;

use go_market_cart::config::{get_env_or_default, get_optional_env};
use go_market_cart::{CartConfig, ConfigError};

const DEFAULT_STORAGE_PATH: &str = ".gomarket/storage.json";

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// File backing the key-value store
    pub storage_path: PathBuf,
    /// Cart store settings
    pub cart: CartConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Also loads .env if present
        let cart = CartConfig::from_env()?;

        Ok(Self {
            storage_path: PathBuf::from(get_env_or_default(
                "GOMARKET_STORAGE_PATH",
                DEFAULT_STORAGE_PATH,
            )),
            cart,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }
}
