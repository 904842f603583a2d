//! Order ledger repository.
//!
//! Owns the atomic cart-to-order conversion and the guarded status
//! transitions of the order state machine. Orders are append-only: after the
//! creating transaction commits, only the `status` and gateway session
//! reference ever change, and both through [`OrderRepository::transition`].

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use verdant_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

use crate::models::{Cart, Order, OrderItem};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    status: String,
    total_cents: Price,
    gateway_session_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    product_id: ProductId,
    quantity: i64,
    price_cents: Price,
    name: String,
    description: Option<String>,
    image: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price_cents,
            name: row.name,
            description: row.description,
            image: row.image,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert a cart snapshot into an order in a single transaction.
    ///
    /// Creates the order (status `pending`, total = snapshot subtotal),
    /// freezes one order item per cart line (price and display metadata as
    /// of the snapshot), and destroys the cart. Deleting the cart row is the
    /// serialization guard for concurrent checkouts of the same token: only
    /// a transaction that actually deletes the row may create an order, so
    /// at most one order exists per cart. Cart lines go with the cart via
    /// `ON DELETE CASCADE`.
    ///
    /// Returns `Ok(None)` if the cart row was already gone, i.e. a competing
    /// checkout consumed it first. Nothing is committed in that case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the whole
    /// transaction rolls back and no partial order or half-emptied cart can
    /// be observed.
    pub async fn create_from_cart(
        &self,
        cart: &Cart,
        user_id: Option<UserId>,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM carts WHERE token = ?")
            .bind(cart.token)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let order_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (user_id, status, total_cents, created_at) \
             VALUES (?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(OrderStatus::Pending.to_string())
        .bind(cart.subtotal())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for item in &cart.items {
            sqlx::query(
                "INSERT INTO order_items \
                 (order_id, product_id, quantity, price_cents, name, description, image) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(item.product.id)
            .bind(item.quantity)
            .bind(item.product.price)
            .bind(&item.product.name)
            .bind(&item.product.description)
            .bind(&item.product.image)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Some(OrderId::new(order_id)))
    }

    /// Get an order with its frozen items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist,
    /// `RepositoryError::DataCorruption` if its stored status is invalid.
    pub async fn get_with_items(&self, order_id: OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, status, total_cents, gateway_session_id, created_at \
             FROM orders WHERE id = ?",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, product_id, quantity, price_cents, name, description, image \
             FROM order_items WHERE order_id = ? ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            status,
            total: row.total_cents,
            gateway_session_id: row.gateway_session_id,
            created_at: row.created_at,
            items: items.into_iter().map(OrderItem::from).collect(),
        })
    }

    /// Advance an order's status, optionally recording the gateway session
    /// reference.
    ///
    /// The update is guarded by the expected current status, so a transition
    /// can never move an order out of a state it has already left (in
    /// particular, never out of a terminal state).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the state machine forbids the
    /// transition, `RepositoryError::NotFound` if the order is missing or no
    /// longer in the expected status.
    pub async fn transition(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        gateway_session_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        if !from.can_transition_to(to) {
            return Err(RepositoryError::Conflict(format!(
                "illegal order status transition: {from} -> {to}"
            )));
        }

        let result = sqlx::query(
            "UPDATE orders \
             SET status = ?, gateway_session_id = COALESCE(?, gateway_session_id) \
             WHERE id = ? AND status = ?",
        )
        .bind(to.to_string())
        .bind(gateway_session_id)
        .bind(order_id)
        .bind(from.to_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
