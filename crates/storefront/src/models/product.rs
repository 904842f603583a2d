//! Catalog entities.
//!
//! Products and categories are read-only from this service's point of view.
//! A product's price is read live wherever a cart subtotal is derived; it is
//! only frozen when a cart becomes an order.

use serde::Serialize;

use verdant_core::{CategoryId, Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Current catalog price (live, not a snapshot).
    #[sqlx(rename = "price_cents")]
    pub price: Price,
    pub category_id: Option<CategoryId>,
}

/// A catalog category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product joined with its category for the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Option<Category>,
}
