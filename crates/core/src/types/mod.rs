//! Core types for GoMarket.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod id;
pub mod price;
pub mod product;

pub use id::{ProductId, ProductIdError};
pub use price::{Price, PriceError};
pub use product::{CartItem, Product};
