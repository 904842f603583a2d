//! Cart repository.
//!
//! Carts are keyed by an opaque client-held token. Line items are unique per
//! (cart, product); re-adding a product increments the existing line via an
//! upsert rather than inserting a duplicate row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use verdant_core::{CartItemId, CartToken, CategoryId, Price, ProductId};

use crate::models::{Cart, CartItem, Product};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct CartRow {
    token: CartToken,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    quantity: i64,
    created_at: DateTime<Utc>,
    product_id: ProductId,
    name: String,
    slug: String,
    description: Option<String>,
    image: Option<String>,
    price_cents: Price,
    category_id: Option<CategoryId>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            product: Product {
                id: row.product_id,
                name: row.name,
                slug: row.slug,
                description: row.description,
                image: row.image,
                price: row.price_cents,
                category_id: row.category_id,
            },
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a cart by token, with its items newest-first and their products
    /// joined at current catalog prices.
    ///
    /// Returns `Ok(None)` if no cart exists for the token; that is a normal
    /// state, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_with_items(
        &self,
        token: CartToken,
    ) -> Result<Option<Cart>, RepositoryError> {
        let cart = sqlx::query_as::<_, CartRow>(
            "SELECT token, created_at FROM carts WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        let Some(cart) = cart else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItemRow>(
            "SELECT ci.id, ci.quantity, ci.created_at, \
                    p.id AS product_id, p.name, p.slug, p.description, p.image, \
                    p.price_cents, p.category_id \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.cart_token = ? \
             ORDER BY ci.created_at DESC, ci.id DESC",
        )
        .bind(token)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(Cart {
            token: cart.token,
            items: items.into_iter().map(CartItem::from).collect(),
            created_at: cart.created_at,
        }))
    }

    /// Create a new empty cart under a freshly generated token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self) -> Result<Cart, RepositoryError> {
        let token = CartToken::generate();
        let created_at = Utc::now();

        sqlx::query("INSERT INTO carts (token, created_at) VALUES (?, ?)")
            .bind(token)
            .bind(created_at)
            .execute(self.pool)
            .await?;

        Ok(Cart {
            token,
            items: Vec::new(),
            created_at,
        })
    }

    /// Add `quantity` of a product to a cart, incrementing the existing line
    /// if the product is already present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product (or cart) does not
    /// exist, `RepositoryError::Database` for other failures.
    pub async fn upsert_item(
        &self,
        token: CartToken,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (cart_token, product_id, quantity, created_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (cart_token, product_id) \
             DO UPDATE SET quantity = quantity + excluded.quantity",
        )
        .bind(token)
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Set the quantity of an existing line. A line the cart does not hold is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_item_quantity(
        &self,
        token: CartToken,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE cart_items SET quantity = ? WHERE cart_token = ? AND product_id = ?")
            .bind(quantity)
            .bind(token)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Remove a line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_item(
        &self,
        token: CartToken,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_token = ? AND product_id = ?")
            .bind(token)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
