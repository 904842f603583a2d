//! Application-level error handling for HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::db::RepositoryError;
use crate::services::{CartError, CheckoutError};

/// Top-level error type returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
    #[error(transparent)]
    Database(#[from] RepositoryError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

/// Session store failures are infrastructure errors, not client errors.
impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session store error: {err}"))
    }
}

impl AppError {
    /// Map the error to an HTTP status and a client-safe message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Cart(CartError::InvalidQuantity { min, got }) => (
                StatusCode::BAD_REQUEST,
                format!("quantity must be at least {min}, got {got}"),
            ),
            Self::Cart(CartError::CartNotFound) => {
                (StatusCode::NOT_FOUND, "Cart not found".to_owned())
            }
            Self::Checkout(CheckoutError::EmptyCart) => {
                (StatusCode::BAD_REQUEST, "Cart is empty".to_owned())
            }
            Self::Checkout(CheckoutError::Gateway(_)) => (
                StatusCode::BAD_GATEWAY,
                "Payment service error".to_owned(),
            ),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Cart(CartError::Repository(_))
            | Self::Checkout(CheckoutError::Repository(_))
            | Self::Database(_)
            | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            ),
        }
    }

    /// Whether this error should be reported to Sentry.
    fn is_server_error(&self) -> bool {
        self.status_and_message().0.is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if self.is_server_error() {
            error!(error = %self, status = %status, "request failed");
            sentry::capture_error(&self);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_quantity_maps_to_bad_request_with_detail() {
        let err = AppError::Cart(CartError::InvalidQuantity { min: 1, got: 0 });
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("at least 1"));
    }

    #[test]
    fn empty_cart_maps_to_bad_request() {
        let err = AppError::Checkout(CheckoutError::EmptyCart);
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Cart is empty");
    }

    #[test]
    fn gateway_failures_map_to_bad_gateway_without_detail() {
        let err = AppError::Checkout(CheckoutError::Gateway(
            crate::payments::PaymentError::Provider {
                status: 500,
                message: "internal stripe detail".to_owned(),
            },
        ));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!message.contains("stripe"));
    }

    #[test]
    fn repository_errors_map_to_internal_server_error() {
        let err = AppError::Database(RepositoryError::NotFound);
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }
}
