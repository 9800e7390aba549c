//! The shopping-cart store.
//!
//! [`CartStore`] owns the authoritative cart for an application session. It
//! hydrates once from a [`KeyValueStore`] in the background, publishes every
//! new cart through a `watch` channel, and mirrors each change back to
//! storage through a [`Persister`].
//!
//! Storage is best-effort durability. A failed or corrupt read starts the
//! session with an empty cart, an unreadable line is dropped on its own, and
//! a failed write is logged and reported but never rolls back the in-memory
//! change. Nothing is written before the stored cart has been read.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use go_market_core::{Cart, CartItem, Product, ProductId};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::config::CartConfig;
use crate::error::{self, CartError, Result};
use crate::persist::Persister;
use crate::storage::KeyValueStore;

/// Shared handle to the session's cart.
///
/// Cloning is cheap and every clone reaches the same cart. Hand one out
/// through a [`CartProvider`](crate::CartProvider) rather than constructing
/// several stores, which would diverge.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    products: watch::Sender<Arc<Cart>>,
    hydrated: watch::Sender<bool>,
    // Both flags are only read and written under the `products` lock.
    // Until `loaded` is set nothing is persisted, so storage is never
    // overwritten by a cart that has not seen the stored one.
    loaded: AtomicBool,
    touched: AtomicBool,
    persister: Persister,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.inner.products.borrow().len())
            .field("hydrated", &*self.inner.hydrated.borrow())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create the store and start hydrating it from `storage`.
    ///
    /// Returns immediately with an empty cart. The persisted cart (if any)
    /// replaces it once the read completes, with any lines added in the
    /// meantime merged on top; use [`ready`](Self::ready) to wait for that.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, config: CartConfig) -> Self {
        let persister = Persister::spawn(
            Arc::clone(&storage),
            config.storage_key.clone(),
            config.write_timeout,
        );

        let store = Self {
            inner: Arc::new(CartStoreInner {
                products: watch::channel(Arc::new(Cart::new())).0,
                hydrated: watch::channel(false).0,
                loaded: AtomicBool::new(false),
                touched: AtomicBool::new(false),
                persister,
            }),
        };

        let loader = store.clone();
        tokio::spawn(async move {
            loader.hydrate(storage.as_ref(), &config.storage_key).await;
        });

        store
    }

    /// The current cart.
    #[must_use]
    pub fn products(&self) -> Arc<Cart> {
        Arc::clone(&self.inner.products.borrow())
    }

    /// Subscribe to cart changes.
    ///
    /// The receiver starts at the current cart and is notified each time a
    /// mutation or the initial load publishes a new one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Cart>> {
        self.inner.products.subscribe()
    }

    /// Whether the initial load from storage has finished.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        *self.inner.hydrated.borrow()
    }

    /// Wait for the initial load from storage to finish.
    ///
    /// Resolves whether or not anything was loaded.
    pub async fn ready(&self) {
        let mut hydrated = self.inner.hydrated.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = hydrated.wait_for(|done| *done).await;
    }

    /// Add one unit of `product` to the cart.
    ///
    /// Accepts anything convertible into a [`Product`]; passing a
    /// [`CartItem`] ignores its quantity.
    #[instrument(skip_all)]
    pub fn add_to_cart(&self, product: impl Into<Product>) {
        let product = product.into();
        let id = product.id.clone();
        self.apply(|cart| Some(cart.with_added(product)));
        debug!(product_id = %id, "Added to cart");
    }

    /// Add one unit to the line for `id`. Unknown ids are ignored.
    #[instrument(skip_all, fields(product_id = %id))]
    pub fn increment(&self, id: &ProductId) {
        if !self.apply(|cart| cart.with_incremented(id)) {
            debug!("Increment ignored, product not in cart");
        }
    }

    /// Remove one unit from the line for `id`, dropping the line at zero.
    /// Unknown ids are ignored.
    #[instrument(skip_all, fields(product_id = %id))]
    pub fn decrement(&self, id: &ProductId) {
        if !self.apply(|cart| cart.with_decremented(id)) {
            debug!("Decrement ignored, product not in cart");
        }
    }

    /// Wait until the latest cart has been written to storage.
    ///
    /// Waits for hydration first, since changes made before the stored cart
    /// loads are only written once they have been merged onto it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::StorageWrite` if that write failed, or
    /// `CartError::WriterStopped` if the background writer is gone.
    pub async fn flush(&self) -> Result<()> {
        self.ready().await;
        self.inner.persister.flush().await
    }

    /// Replace the cart with `next(cart)` and queue it for persistence.
    ///
    /// `None` means nothing changed: subscribers are not woken and nothing
    /// is written. Returns whether the cart changed.
    fn apply(&self, next: impl FnOnce(&Cart) -> Option<Cart>) -> bool {
        let inner = &self.inner;
        inner.products.send_if_modified(|current| {
            let Some(updated) = next(&**current) else {
                return false;
            };
            let updated = Arc::new(updated);
            *current = Arc::clone(&updated);
            // Submitted under the channel lock so snapshots reach the
            // writer in mutation order.
            if inner.loaded.load(Ordering::SeqCst) {
                inner.persister.submit(updated);
            } else {
                inner.touched.store(true, Ordering::SeqCst);
            }
            true
        })
    }

    async fn hydrate(&self, storage: &dyn KeyValueStore, key: &str) {
        let stored = match load_items(storage, key).await {
            Ok(Some(items)) => Some(items),
            Ok(None) => {
                debug!("No stored cart, starting empty");
                None
            }
            Err(e) => {
                error::report(&e, "Ignoring unreadable stored cart, starting empty");
                None
            }
        };

        let inner = &self.inner;
        let mut early_lines = 0;
        inner.products.send_if_modified(|current| {
            inner.loaded.store(true, Ordering::SeqCst);
            let touched = inner.touched.load(Ordering::SeqCst);
            if touched {
                early_lines = current.len();
            }

            let changed = match stored {
                Some(mut items) => {
                    // Replay lines added before the load on top of the stored
                    // cart; repeated ids merge into the stored line.
                    if touched {
                        items.extend(current.items().iter().cloned());
                    }
                    *current = Arc::new(Cart::from_items(items));
                    true
                }
                None => false,
            };

            if touched {
                inner.persister.submit(Arc::clone(current));
            }
            changed
        });

        let count = self.inner.products.borrow().len();
        if early_lines > 0 {
            info!(
                items = count,
                early_lines, "Cart restored from storage with changes made during load"
            );
        } else {
            info!(items = count, "Cart hydrated");
        }

        self.inner.hydrated.send_replace(true);
    }
}

/// Read the stored cart.
///
/// A value that is not a JSON list is an error. Individual lines that fail
/// to decode are skipped with a warning so one bad line does not cost the
/// rest of the cart.
async fn load_items(storage: &dyn KeyValueStore, key: &str) -> Result<Option<Vec<CartItem>>> {
    let Some(raw) = storage.get(key).await.map_err(CartError::StorageRead)? else {
        return Ok(None);
    };
    let lines: Vec<serde_json::Value> = serde_json::from_str(&raw).map_err(CartError::Deserialize)?;

    let items = lines
        .into_iter()
        .enumerate()
        .filter_map(|(index, line)| match serde_json::from_value(line) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable stored cart line");
                None
            }
        })
        .collect();
    Ok(Some(items))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use go_market_core::Price;

    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_support::{FailingStore, GatedStore};

    const KEY: &str = "@GoMarket:Products";

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::parse(id).unwrap(),
            title: "Shirt".to_string(),
            image_url: "u".to_string(),
            price: Price::from(10),
        }
    }

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn config() -> CartConfig {
        CartConfig {
            write_timeout: Duration::from_secs(1),
            ..CartConfig::default()
        }
    }

    async fn stored_cart(storage: &MemoryStore) -> Option<Cart> {
        let raw = storage.get(KEY).await.unwrap()?;
        Some(serde_json::from_str(&raw).unwrap())
    }

    #[tokio::test]
    async fn test_starts_empty_without_stored_cart() {
        let store = CartStore::new(Arc::new(MemoryStore::new()), config());
        store.ready().await;
        assert!(store.is_hydrated());
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_hydrates_from_storage() {
        let json = r#"[{"id":"a","title":"Shirt","image_url":"u","price":10,"quantity":3}]"#;
        let store = CartStore::new(Arc::new(MemoryStore::with_entries([(KEY, json)])), config());
        store.ready().await;

        let cart = store.products();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&id("a")).unwrap().quantity.get(), 3);
    }

    #[tokio::test]
    async fn test_corrupt_stored_cart_starts_empty() {
        let storage = MemoryStore::with_entries([(KEY, "{not json")]);
        let store = CartStore::new(Arc::new(storage), config());
        store.ready().await;
        assert!(store.products().is_empty());

        store.add_to_cart(product("a"));
        assert_eq!(store.products().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_quantity_in_storage_is_rejected() {
        let json = r#"[{"id":"a","title":"Shirt","image_url":"u","price":10,"quantity":0}]"#;
        let store = CartStore::new(Arc::new(MemoryStore::with_entries([(KEY, json)])), config());
        store.ready().await;
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_starts_empty_and_stays_usable() {
        let store = CartStore::new(Arc::new(FailingStore), config());
        store.ready().await;
        assert!(store.products().is_empty());

        store.add_to_cart(product("a"));
        store.increment(&id("a"));
        assert_eq!(store.products().get(&id("a")).unwrap().quantity.get(), 2);

        // The write fails, but the in-memory cart is kept.
        assert!(matches!(store.flush().await, Err(CartError::StorageWrite(_))));
        assert_eq!(store.products().len(), 1);
    }

    #[tokio::test]
    async fn test_mutation_before_load_merges_onto_stored_cart() {
        let json = r#"[{"id":"old","title":"Old","image_url":"u","price":1,"quantity":5}]"#;
        let storage = Arc::new(GatedStore::with_value(Some(json.to_string())));
        let store = CartStore::new(storage.clone(), config());

        store.add_to_cart(product("a"));
        assert!(!store.is_hydrated());

        storage.open();
        store.flush().await.unwrap();

        let cart = store.products();
        let order: Vec<&str> = cart.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(order, ["old", "a"]);
        assert_eq!(cart.get(&id("old")).unwrap().quantity.get(), 5);

        // One write, made after the load, holding both carts.
        let writes = storage.writes().await;
        assert_eq!(writes.len(), 1);
        let written: Cart = serde_json::from_str(&writes[0]).unwrap();
        assert_eq!(written, *cart);
    }

    #[tokio::test]
    async fn test_early_add_of_stored_id_adds_to_stored_quantity() {
        let json = r#"[{"id":"a","title":"Stored","image_url":"u","price":1,"quantity":5}]"#;
        let storage = Arc::new(GatedStore::with_value(Some(json.to_string())));
        let store = CartStore::new(storage.clone(), config());

        store.add_to_cart(product("a"));
        storage.open();
        store.ready().await;

        let line = store.products().get(&id("a")).cloned().unwrap();
        assert_eq!(line.quantity.get(), 6);
        assert_eq!(line.title, "Stored");
    }

    #[tokio::test]
    async fn test_early_mutation_without_stored_cart_is_persisted() {
        let storage = Arc::new(GatedStore::new());
        let store = CartStore::new(storage.clone(), config());

        store.add_to_cart(product("a"));
        storage.open();
        store.flush().await.unwrap();

        let writes = storage.writes().await;
        assert_eq!(writes.len(), 1);
        let written: Cart = serde_json::from_str(&writes[0]).unwrap();
        assert_eq!(written.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_lines_are_skipped_individually() {
        let json = r#"[
            {"id":"a","title":"Shirt","image_url":"u","price":10,"quantity":2},
            {"id":"","title":"No id","image_url":"u","price":1,"quantity":1},
            {"id":"b","title":"Yacht","image_url":"u","price":1e30,"quantity":1},
            {"id":"c","title":"Zero","image_url":"u","price":1,"quantity":0},
            {"id":"d","title":"Huge","image_url":"u","price":1,"quantity":5000000000}
        ]"#;
        let store = CartStore::new(Arc::new(MemoryStore::with_entries([(KEY, json)])), config());
        store.ready().await;

        let cart = store.products();
        let order: Vec<&str> = cart.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(order, ["a", "b"]);
        assert_eq!(cart.get(&id("a")).unwrap().quantity.get(), 2);
        assert_eq!(cart.get(&id("b")).unwrap().price, "1e30".parse().unwrap());
    }

    #[tokio::test]
    async fn test_stored_value_that_is_not_a_list_starts_empty() {
        let json = r#"{"id":"a","quantity":1}"#;
        let store = CartStore::new(Arc::new(MemoryStore::with_entries([(KEY, json)])), config());
        store.ready().await;
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_persists_post_mutation_state() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::new(storage.clone(), config());
        store.ready().await;

        store.add_to_cart(product("a"));
        store.flush().await.unwrap();

        let stored = stored_cart(&storage).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get(&id("a")).unwrap().quantity.get(), 1);

        store.add_to_cart(product("a"));
        store.decrement(&id("a"));
        store.decrement(&id("a"));
        store.flush().await.unwrap();
        assert!(stored_cart(&storage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_noop_mutations_do_not_write_or_notify() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::new(storage.clone(), config());
        store.ready().await;

        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.increment(&id("missing"));
        store.decrement(&id("missing"));
        store.flush().await.unwrap();

        assert!(!rx.has_changed().unwrap());
        assert_eq!(storage.write_count(), 0);
        assert!(stored_cart(&storage).await.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_each_mutation() {
        let store = CartStore::new(Arc::new(MemoryStore::new()), config());
        store.ready().await;

        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.add_to_cart(product("a"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.increment(&id("a"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_previous_snapshots_are_not_mutated() {
        let store = CartStore::new(Arc::new(MemoryStore::new()), config());
        store.ready().await;

        store.add_to_cart(product("a"));
        let before = store.products();
        store.increment(&id("a"));

        assert_eq!(before.get(&id("a")).unwrap().quantity.get(), 1);
        assert_eq!(store.products().get(&id("a")).unwrap().quantity.get(), 2);
        assert!(!Arc::ptr_eq(&before, &store.products()));
    }

    #[tokio::test]
    async fn test_clones_share_one_cart() {
        let store = CartStore::new(Arc::new(MemoryStore::new()), config());
        let other = store.clone();
        store.ready().await;

        other.add_to_cart(product("a"));
        assert_eq!(store.products().len(), 1);
    }

    #[tokio::test]
    async fn test_add_cart_item_ignores_quantity() {
        let store = CartStore::new(Arc::new(MemoryStore::new()), config());
        store.ready().await;

        let mut item = CartItem::first_unit(product("a"));
        item.quantity = std::num::NonZeroU32::new(9).unwrap();
        store.add_to_cart(item);

        assert_eq!(store.products().get(&id("a")).unwrap().quantity.get(), 1);
    }
}
