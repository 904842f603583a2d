//! Order ledger model.
//!
//! An order is an immutable snapshot of a cart taken at checkout. Its total
//! and items are computed once and frozen forever; later catalog changes
//! never retroactively alter a placed order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdant_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// A frozen copy of a cart line at order-creation time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Unit price at the moment the order was created.
    pub price: Price,
    /// Display metadata frozen alongside the price; the payment session
    /// describes what was bought, not the catalog's current state.
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// A placed order with its frozen items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Checkout actor, or `None` for guest checkout.
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    /// Total frozen at creation (the cart subtotal at that instant).
    pub total: Price,
    /// Payment provider session reference, set once a session exists.
    pub gateway_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}
