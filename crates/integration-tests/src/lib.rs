//! Integration tests for GoMarket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p go-market-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenario` - Reducer behavior through the store and provider scope
//! - `cart_persistence` - Round trips through `FileStore` across restarts
//!
//! Shared fixtures live here so each test file stays focused on behavior.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use go_market_cart::{CartConfig, CartStore, KeyValueStore};
use go_market_core::{Price, Product, ProductId};

/// A product with the given id and otherwise fixed fields.
///
/// # Panics
///
/// Panics if `id` is empty.
#[must_use]
pub fn product(id: &str, title: &str, price: i64) -> Product {
    Product {
        id: pid(id),
        title: title.to_string(),
        image_url: format!("https://img.example/{id}.png"),
        price: Price::from(price),
    }
}

/// Parse a product id.
///
/// # Panics
///
/// Panics if `id` is empty.
#[must_use]
pub fn pid(id: &str) -> ProductId {
    ProductId::parse(id).expect("test product ids are non-empty")
}

/// Config with a short write timeout so failing tests fail fast.
#[must_use]
pub fn test_config() -> CartConfig {
    CartConfig {
        write_timeout: Duration::from_secs(2),
        ..CartConfig::default()
    }
}

/// Open a store on `storage` and wait for it to hydrate.
pub async fn open_store(storage: Arc<dyn KeyValueStore>) -> CartStore {
    let store = CartStore::new(storage, test_config());
    store.ready().await;
    store
}

/// A storage file path in a fresh temp directory.
#[must_use]
pub fn temp_storage_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("go-market-it-{}", uuid::Uuid::new_v4()))
        .join("storage.json")
}

/// Remove the temp directory created for `path`.
pub fn cleanup(path: &Path) {
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}
