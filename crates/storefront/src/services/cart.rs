//! Cart operations.
//!
//! All operations take the opaque cart token explicitly. Reads go through
//! the tagged cache under the cart's own tag; every mutation invalidates
//! that tag before returning, so the caller's next read is fresh.

use sqlx::SqlitePool;
use tracing::instrument;

use verdant_core::{CartToken, ProductId};

use crate::cache::{CacheKey, CacheTag, CacheValue, TaggedCache};
use crate::db::{CartRepository, RepositoryError};
use crate::models::Cart;

/// Errors from cart operations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// The requested quantity violates the operation's lower bound.
    #[error("quantity must be at least {min}, got {got}")]
    InvalidQuantity { min: i64, got: i64 },

    /// The caller has no cart to operate on.
    #[error("cart not found")]
    CartNotFound,

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Service for cart reads and mutations.
pub struct CartService<'a> {
    pool: &'a SqlitePool,
    cache: &'a TaggedCache,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, cache: &'a TaggedCache) -> Self {
        Self { pool, cache }
    }

    /// Resolve the caller's cart.
    ///
    /// Returns `Ok(None)` when the caller presents no token or the token
    /// matches no cart; neither is an error. The read is cached under the
    /// cart's tag.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, token: Option<CartToken>) -> Result<Option<Cart>, CartError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let key = CacheKey::Cart { token };
        if let Some(CacheValue::Cart(cart)) = self.cache.get(&key).await {
            return Ok(Some(*cart));
        }

        let cart = CartRepository::new(self.pool)
            .find_with_items(token)
            .await?;

        if let Some(cart) = &cart {
            self.cache
                .insert(key, CacheValue::Cart(Box::new(cart.clone())))
                .await;
        }

        Ok(cart)
    }

    /// Return the caller's cart, creating a new empty one if none exists.
    ///
    /// The returned cart's token is the caller's handle; the boundary layer
    /// persists it (session cookie) when it differs from what was presented.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, token: Option<CartToken>) -> Result<Cart, CartError> {
        let repo = CartRepository::new(self.pool);

        if let Some(token) = token
            && let Some(cart) = repo.find_with_items(token).await?
        {
            return Ok(cart);
        }

        Ok(repo.create().await?)
    }

    /// Add `quantity` of a product to the caller's cart, creating the cart
    /// if needed. Re-adding a product increments its existing line.
    ///
    /// Returns the token of the cart that was mutated.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 1`,
    /// `CartError::Repository` on storage failure (including an unknown
    /// product).
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        token: Option<CartToken>,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartToken, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity {
                min: 1,
                got: quantity,
            });
        }

        let cart = self.get_or_create_cart(token).await?;

        CartRepository::new(self.pool)
            .upsert_item(cart.token, product_id, quantity)
            .await?;

        self.cache.invalidate(&CacheTag::Cart(cart.token)).await;

        Ok(cart.token)
    }

    /// Set a line's quantity. Zero deletes the line; that is the removal
    /// path, not an error. A product the cart does not hold is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 0`,
    /// `CartError::CartNotFound` if the caller has no cart,
    /// `CartError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        token: Option<CartToken>,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity {
                min: 0,
                got: quantity,
            });
        }

        let Some(token) = token else {
            return Err(CartError::CartNotFound);
        };

        let repo = CartRepository::new(self.pool);
        if repo.find_with_items(token).await?.is_none() {
            return Err(CartError::CartNotFound);
        }

        if quantity == 0 {
            repo.delete_item(token, product_id).await?;
        } else {
            repo.set_item_quantity(token, product_id, quantity).await?;
        }

        self.cache.invalidate(&CacheTag::Cart(token)).await;

        Ok(())
    }
}
