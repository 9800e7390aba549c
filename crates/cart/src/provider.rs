//! Provisioning scope for the session's cart.
//!
//! One [`CartStore`] is created per application run and made reachable to
//! everything running inside a [`CartProvider`] scope. Code that needs the
//! cart calls [`use_cart`] instead of being handed a store directly, and
//! gets a configuration error if it runs outside any scope instead of a
//! silently detached cart.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use go_market_cart::{CartConfig, CartProvider, CartStore, MemoryStore, use_cart};
//!
//! # async fn demo() -> Result<(), go_market_cart::CartError> {
//! let store = CartStore::new(Arc::new(MemoryStore::new()), CartConfig::default());
//!
//! CartProvider::new(store)
//!     .scope(async {
//!         let cart = use_cart()?;
//!         println!("{} lines", cart.products().len());
//!         Ok::<_, go_market_cart::CartError>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! The scope is task-local: tasks spawned with `tokio::spawn` from inside it
//! do not inherit it. Wrap their futures in [`CartProvider::scope`] again.

use std::future::Future;

use crate::error::{CartError, Result};
use crate::store::CartStore;

tokio::task_local! {
    static CURRENT_CART: CartStore;
}

/// Makes one [`CartStore`] available to [`use_cart`] callers within a scope.
#[derive(Debug, Clone)]
pub struct CartProvider {
    store: CartStore,
}

impl CartProvider {
    #[must_use]
    pub const fn new(store: CartStore) -> Self {
        Self { store }
    }

    /// Run `fut` with this provider's store in scope.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT_CART.scope(self.store, fut).await
    }

    /// Run `f` synchronously with this provider's store in scope.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT_CART.sync_scope(self.store, f)
    }
}

/// Get the cart store of the enclosing [`CartProvider`] scope.
///
/// # Errors
///
/// Returns `CartError::Configuration` when called outside of a scope.
pub fn use_cart() -> Result<CartStore> {
    CURRENT_CART.try_with(CartStore::clone).map_err(|_| {
        CartError::Configuration("use_cart must be used within a CartProvider".to_string())
    })
}
