//! Cart route handlers.
//!
//! The cart token lives in the session; handlers resolve it to an explicit
//! argument before calling into `CartService`, and write it back whenever an
//! operation creates a cart for a new visitor.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use verdant_core::{CartToken, Price, ProductId};

use crate::error::AppError;
use crate::models::{Cart, keys};
use crate::services::CartService;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart token from the session.
pub async fn get_cart_token(session: &Session) -> Option<CartToken> {
    session
        .get::<CartToken>(keys::CART_TOKEN)
        .await
        .ok()
        .flatten()
}

/// Set the cart token in the session.
pub async fn set_cart_token(
    session: &Session,
    token: CartToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_TOKEN, token).await
}

/// Remove the cart token from the session.
pub async fn clear_cart_token(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CartToken>(keys::CART_TOKEN).await?;
    Ok(())
}

// =============================================================================
// View Types
// =============================================================================

/// Cart line item display data.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub quantity: i64,
    /// Current unit price, formatted for display.
    pub price: String,
    pub line_total: String,
}

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: usize,
}

impl CartView {
    /// An empty cart for callers who have none yet.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Price::ZERO.to_string(),
            item_count: 0,
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product.id,
                    name: item.product.name.clone(),
                    slug: item.product.slug.clone(),
                    image: item.product.image.clone(),
                    quantity: item.quantity,
                    price: item.product.price.to_string(),
                    line_total: item.line_total().to_string(),
                })
                .collect(),
            subtotal: cart.subtotal().to_string(),
            item_count: cart.size(),
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    /// Defaults to 1.
    pub quantity: Option<i64>,
}

/// Update-cart request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    /// Zero removes the line.
    pub quantity: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the caller's cart. A visitor without a cart gets the empty view.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartView>, AppError> {
    let token = get_cart_token(&session).await;
    let cart = CartService::new(state.pool(), state.cache())
        .get_cart(token)
        .await?;

    Ok(Json(cart.as_ref().map_or_else(CartView::empty, CartView::from)))
}

/// Add a product to the cart, creating the cart on first use.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>, AppError> {
    let service = CartService::new(state.pool(), state.cache());
    let presented = get_cart_token(&session).await;

    let token = service
        .add_to_cart(presented, request.product_id, request.quantity.unwrap_or(1))
        .await?;

    // A new visitor just received a cart; persist its token.
    if presented != Some(token) {
        set_cart_token(&session, token).await?;
    }

    let cart = service.get_cart(Some(token)).await?;
    Ok(Json(cart.as_ref().map_or_else(CartView::empty, CartView::from)))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>, AppError> {
    let token = get_cart_token(&session).await;
    let service = CartService::new(state.pool(), state.cache());

    service
        .set_quantity(token, request.product_id, request.quantity)
        .await?;

    let cart = service.get_cart(token).await?;
    Ok(Json(cart.as_ref().map_or_else(CartView::empty, CartView::from)))
}
