//! GoMarket Core - Shared cart types.
//!
//! This crate provides the types used by every GoMarket component:
//! - `cart` - The cart store with persistence and provisioning scope
//! - `cli` - Command-line consumer of a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage access, no async runtime. The cart reducer lives here so it can
//! be tested without a store around it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product ids and prices, plus line items
//! - [`cart`] - The ordered cart list and its add/increment/decrement reducer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::Cart;
pub use types::*;
