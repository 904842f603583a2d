//! Payment gateway boundary.
//!
//! The checkout orchestrator talks to the external payment provider only
//! through [`PaymentGateway`], so the provider client can be swapped for a
//! fake in tests. The production implementation is [`StripeClient`].

mod stripe;

pub use stripe::StripeClient;

use crate::models::Order;

/// A provider checkout session the customer is redirected to.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Provider session reference, stored on the order for correlation.
    pub id: String,
    /// Hosted checkout URL to redirect the customer to.
    pub url: String,
}

/// Errors from payment session creation.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The order has no items. Defensive: orders are created from non-empty
    /// carts, so this should be unreachable.
    #[error("order has no items")]
    EmptyOrder,

    /// The provider request could not be sent or the response not read.
    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("payment provider rejected the request (HTTP {status}): {message}")]
    Provider { status: u16, message: String },

    /// The provider answered, but without a usable session reference.
    #[error("unusable payment session: {0}")]
    InvalidSession(String),
}

/// Translates an order into a provider checkout session.
///
/// Line items are built from the order's *frozen* prices and display
/// metadata, and the order identity (plus the user identity when present)
/// travels as opaque correlation metadata so asynchronous payment
/// confirmation can be matched back to the order.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Create a checkout session for `order`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::EmptyOrder` for an order without items, or a
    /// provider/transport error otherwise.
    async fn create_session(&self, order: &Order) -> Result<CheckoutSession, PaymentError>;
}
