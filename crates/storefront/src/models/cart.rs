//! Shopping cart model.
//!
//! Carts are provisional: line items reference live catalog products, and the
//! derived subtotal uses the product's *current* price on every read. Nothing
//! is frozen until checkout converts the cart into an order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdant_core::{CartItemId, CartToken, Price};

use super::product::Product;

/// A line item in a cart.
///
/// The (cart, product) pair is unique; re-adding a product increments the
/// existing line instead of duplicating it.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: Product,
    /// Always >= 1; setting a line to zero deletes it.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// Line total at the product's current price.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.product.price.line_total(self.quantity)
    }
}

/// A shopping cart with its items, newest first.
///
/// A cart with zero items is valid and distinct from "no cart".
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub token: CartToken,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Number of line items.
    #[must_use]
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Derived subtotal at current catalog prices. Never stored.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
