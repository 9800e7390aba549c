//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! gm-cli list
//!
//! # Add one unit of a product
//! gm-cli add sku-1 --title "Shirt" --image-url https://img.example/shirt.png --price 19.99
//!
//! # Change quantities
//! gm-cli increment sku-1
//! gm-cli decrement sku-1
//! ```
//!
//! Every command opens the file-backed store, waits for the stored cart to
//! load, runs inside a `CartProvider` scope, and flushes before printing.

use std::fmt::Write as _;
use std::sync::Arc;

use go_market_cart::{CartError, CartProvider, CartStore, FileStore, use_cart};
use go_market_core::{Cart, Product, ProductId};
use tracing::info;

use crate::config::CliConfig;

/// A single cart operation requested on the command line.
#[derive(Debug)]
pub enum CartAction {
    List,
    Add(Product),
    Increment(ProductId),
    Decrement(ProductId),
}

/// Run `action` against the configured cart and print the result.
///
/// # Errors
///
/// Returns `CartError` if the store is unreachable from the provider scope
/// or if the updated cart could not be written to storage.
pub async fn run(config: &CliConfig, action: CartAction) -> Result<(), CartError> {
    let storage = Arc::new(FileStore::new(&config.storage_path));
    let store = CartStore::new(storage, config.cart.clone());
    store.ready().await;

    info!(
        path = %config.storage_path.display(),
        items = store.products().len(),
        "Cart opened"
    );

    let cart = CartProvider::new(store)
        .scope(async move {
            let cart = use_cart()?;
            match action {
                CartAction::List => {}
                CartAction::Add(product) => cart.add_to_cart(product),
                CartAction::Increment(id) => cart.increment(&id),
                CartAction::Decrement(id) => cart.decrement(&id),
            }
            cart.flush().await?;
            Ok::<_, CartError>(cart.products())
        })
        .await?;

    print_cart(&cart);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    print!("{}", render_cart(cart));
}

/// Format the cart as one line per item plus a unit count.
fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in cart {
        let _ = writeln!(
            out,
            "{:>4} x {} [{}] @ {}",
            item.quantity, item.title, item.id, item.price
        );
    }
    let _ = writeln!(
        out,
        "{} line(s), {} unit(s)",
        cart.len(),
        cart.total_quantity()
    );
    out
}
