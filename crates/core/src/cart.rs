//! The cart list and its reducer.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s with at most one entry per
//! product id. Lines keep their insertion order; changing a quantity never
//! moves a line. Every operation returns a new `Cart` and leaves `self`
//! untouched, so a store can publish each result as a fresh snapshot.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::{CartItem, Product, ProductId};

/// Ordered cart lines, one per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from a list of lines, merging repeated ids.
    ///
    /// A repeated id is folded into its first occurrence with the quantities
    /// added together (saturating). Order of first occurrence is kept.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
        for item in items {
            if let Some(existing) = merged.iter_mut().find(|line| line.id == item.id) {
                existing.quantity = existing.quantity.saturating_add(item.quantity.get());
            } else {
                merged.push(item);
            }
        }
        Self { items: merged }
    }

    /// The cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up the line for `id`.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Add one unit of `product`.
    ///
    /// An existing line for the same id gains one unit and keeps its own
    /// title, image and price. Otherwise a new line with quantity 1 is
    /// appended.
    #[must_use]
    pub fn with_added(&self, product: Product) -> Self {
        if self.get(&product.id).is_some() {
            return self.map_line(&product.id, |q| Some(q.saturating_add(1)));
        }

        let mut items = self.items.clone();
        items.push(CartItem::first_unit(product));
        Self { items }
    }

    /// Add one unit to the line for `id`.
    ///
    /// Returns `None` when no line matches, leaving the cart unchanged.
    #[must_use]
    pub fn with_incremented(&self, id: &ProductId) -> Option<Self> {
        self.get(id)?;
        Some(self.map_line(id, |q| Some(q.saturating_add(1))))
    }

    /// Remove one unit from the line for `id`.
    ///
    /// The last unit removes the line entirely. Returns `None` when no line
    /// matches.
    #[must_use]
    pub fn with_decremented(&self, id: &ProductId) -> Option<Self> {
        self.get(id)?;
        Some(self.map_line(id, |q| NonZeroU32::new(q.get() - 1)))
    }

    /// Rebuild the list with the quantity of `id` rewritten by `f`.
    /// A `None` quantity drops the line.
    fn map_line(&self, id: &ProductId, f: impl Fn(NonZeroU32) -> Option<NonZeroU32>) -> Self {
        let items = self
            .items
            .iter()
            .filter_map(|item| {
                if &item.id != id {
                    return Some(item.clone());
                }
                f(item.quantity).map(|quantity| CartItem {
                    quantity,
                    ..item.clone()
                })
            })
            .collect();
        Self { items }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
