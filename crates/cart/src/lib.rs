//! GoMarket Cart - Persistent shopping-cart store.
//!
//! Holds the session's cart in memory, publishes every change to
//! subscribers, and mirrors the cart to a key-value store so it survives
//! restarts.
//!
//! # Architecture
//!
//! - [`CartStore`] - Authoritative in-memory cart, hydrated once at startup
//! - [`Persister`] - Single-slot write-behind writer (newest snapshot wins)
//! - [`storage`] - `KeyValueStore` trait with memory and file backends
//! - [`CartProvider`] / [`use_cart`] - One shared store per application scope
//!
//! The in-memory cart is always the source of truth. Storage failures are
//! logged and reported to Sentry, never propagated out of mutations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod persist;
pub mod provider;
pub mod storage;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::{CartConfig, ConfigError, DEFAULT_STORAGE_KEY};
pub use error::{CartError, StorageError};
pub use persist::Persister;
pub use provider::{CartProvider, use_cart};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::CartStore;
