//! Checkout route handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::models::{CurrentUser, Order, keys};
use crate::routes::cart::{clear_cart_token, get_cart_token};
use crate::services::CheckoutService;
use crate::state::AppState;

/// Successful checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Hosted payment page to redirect the customer to.
    pub checkout_url: String,
    /// The order, frozen and awaiting payment.
    pub order: Order,
}

/// Convert the caller's cart into an order and a payment session.
///
/// The cart is consumed either way; on success the session's cart token is
/// cleared so the next visit starts fresh.
#[instrument(skip(state, session))]
pub async fn process(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutResponse>, AppError> {
    let token = get_cart_token(&session).await;
    let user = session.get::<CurrentUser>(keys::CURRENT_USER).await?;

    let outcome = CheckoutService::new(state.pool(), state.cache(), state.payments())
        .process_checkout(token, user.map(|u| u.id))
        .await?;

    clear_cart_token(&session).await?;

    Ok(Json(CheckoutResponse {
        checkout_url: outcome.checkout_url,
        order: outcome.order,
    }))
}
