//! Checkout orchestration.
//!
//! Converts a cart into an order and coordinates the external payment
//! provider. This is a two-phase protocol, not one atomic unit:
//!
//! 1. A storage transaction snapshots the cart into an order and destroys
//!    the cart (see `OrderRepository::create_from_cart`). Nothing partial
//!    can ever be observed.
//! 2. The gateway call happens after commit, because a network call must
//!    not hold a storage transaction open. A gateway failure cannot roll
//!    phase 1 back; the compensating action is the `pending -> failed`
//!    status transition. The order is the durable record either way.
//!
//! The cart is destroyed whether or not session creation succeeds; a caller
//! who retries starts from an empty cart.

use sqlx::SqlitePool;
use tracing::instrument;

use verdant_core::{CartToken, OrderStatus, UserId};

use crate::cache::{CacheTag, TaggedCache};
use crate::db::{CartRepository, OrderRepository, RepositoryError};
use crate::models::Order;
use crate::payments::{PaymentError, PaymentGateway};

/// Errors from checkout.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The caller has no cart, or the cart has no items. No order is
    /// created.
    #[error("cart is empty")]
    EmptyCart,

    /// Payment session creation failed. The order exists and has been moved
    /// to `failed`.
    #[error("payment gateway error: {0}")]
    Gateway(#[from] PaymentError),

    /// Storage failure. If this comes from the creation transaction,
    /// nothing committed and the caller may retry safely.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of a successful checkout.
#[derive(Debug)]
pub struct CheckoutOutcome {
    /// Hosted checkout URL to redirect the customer to.
    pub checkout_url: String,
    /// The finalized order (status `pending_payment`).
    pub order: Order,
}

/// Service orchestrating the cart-to-order conversion.
pub struct CheckoutService<'a, G> {
    pool: &'a SqlitePool,
    cache: &'a TaggedCache,
    gateway: &'a G,
}

impl<'a, G: PaymentGateway> CheckoutService<'a, G> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, cache: &'a TaggedCache, gateway: &'a G) -> Self {
        Self {
            pool,
            cache,
            gateway,
        }
    }

    /// Convert the caller's cart into an order and create a payment session.
    ///
    /// Exactly one order is created per successful call; of two concurrent
    /// calls for the same token, one wins and the other fails with
    /// `EmptyCart`.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::EmptyCart` if there is nothing to purchase.
    /// - `CheckoutError::Gateway` if session creation fails; the committed
    ///   order is marked `failed`, never deleted.
    /// - `CheckoutError::Repository` on storage failure.
    #[instrument(skip(self), fields(user_id = ?user_id))]
    pub async fn process_checkout(
        &self,
        token: Option<CartToken>,
        user_id: Option<UserId>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let Some(token) = token else {
            return Err(CheckoutError::EmptyCart);
        };

        // Snapshot straight from storage, not the cache: the prices read
        // here become the order's frozen prices.
        let cart = CartRepository::new(self.pool)
            .find_with_items(token)
            .await?;

        let Some(cart) = cart else {
            return Err(CheckoutError::EmptyCart);
        };
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let orders = OrderRepository::new(self.pool);

        let Some(order_id) = orders.create_from_cart(&cart, user_id).await? else {
            // A concurrent checkout consumed the cart between our snapshot
            // and the transaction.
            self.cache.invalidate(&CacheTag::Cart(token)).await;
            return Err(CheckoutError::EmptyCart);
        };

        // The cart no longer exists; flush cached reads of it before the
        // caller can observe success.
        self.cache.invalidate(&CacheTag::Cart(token)).await;

        tracing::info!(order_id = %order_id, total = %cart.subtotal(), "order created from cart");

        let order = orders.get_with_items(order_id).await?;

        match self.gateway.create_session(&order).await {
            Ok(session) => {
                orders
                    .transition(
                        order_id,
                        OrderStatus::Pending,
                        OrderStatus::PendingPayment,
                        Some(&session.id),
                    )
                    .await?;

                let order = orders.get_with_items(order_id).await?;

                Ok(CheckoutOutcome {
                    checkout_url: session.url,
                    order,
                })
            }
            Err(err) => {
                tracing::error!(
                    order_id = %order_id,
                    error = %err,
                    "payment session creation failed; marking order failed"
                );

                // Compensating transition; the order itself must survive.
                if let Err(transition_err) = orders
                    .transition(order_id, OrderStatus::Pending, OrderStatus::Failed, None)
                    .await
                {
                    tracing::error!(
                        order_id = %order_id,
                        error = %transition_err,
                        "failed to mark order as failed"
                    );
                }

                Err(CheckoutError::Gateway(err))
            }
        }
    }
}
