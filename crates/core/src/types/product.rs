//! Catalog products and cart line items.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as handed to the cart by the catalog.
///
/// Every field is opaque to the cart except `id`, which is the line key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

/// One line of the cart: a product plus how many units of it are held.
///
/// `quantity` is never zero. The persisted JSON uses the same field names,
/// so a stored `"quantity": 0` fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: NonZeroU32,
}

impl CartItem {
    /// Start a new line for `product` holding a single unit.
    #[must_use]
    pub fn first_unit(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity: NonZeroU32::MIN,
        }
    }
}

/// Re-adding a line item to the cart ignores its quantity.
impl From<CartItem> for Product {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
        }
    }
}
