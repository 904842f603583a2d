//! Stripe Checkout Sessions client.
//!
//! Creates hosted checkout sessions via the form-encoded
//! `/v1/checkout/sessions` endpoint. Only the session-creation contract is
//! consumed here; the hosted checkout UI and asynchronous confirmation flow
//! are external.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::config::StripeConfig;
use crate::models::Order;

use super::{CheckoutSession, PaymentError, PaymentGateway};

/// Client for the Stripe Checkout Sessions API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    secret_key: SecretString,
    success_url: String,
    cancel_url: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// `base_url` is the storefront's public URL; the customer returns to
    /// `{base_url}/checkout/success` or `{base_url}/checkout/cancel`, with
    /// the session id substituted by the provider.
    #[must_use]
    pub fn new(config: &StripeConfig, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');

        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                endpoint: format!("{}/v1/checkout/sessions", config.api_base.trim_end_matches('/')),
                api_version: config.api_version.clone(),
                secret_key: config.secret_key.clone(),
                success_url: format!("{base}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
                cancel_url: format!("{base}/checkout/cancel?session_id={{CHECKOUT_SESSION_ID}}"),
            }),
        }
    }

    /// Build the form-encoded request body for an order.
    fn session_params(&self, order: &Order) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_owned(), "payment".to_owned()),
            ("payment_method_types[0]".to_owned(), "card".to_owned()),
            ("success_url".to_owned(), self.inner.success_url.clone()),
            ("cancel_url".to_owned(), self.inner.cancel_url.clone()),
            ("metadata[order_id]".to_owned(), order.id.to_string()),
        ];

        if let Some(user_id) = order.user_id {
            params.push(("metadata[user_id]".to_owned(), user_id.to_string()));
        }

        for (i, item) in order.items.iter().enumerate() {
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                "usd".to_owned(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            if let Some(description) = &item.description {
                params.push((
                    format!("line_items[{i}][price_data][product_data][description]"),
                    description.clone(),
                ));
            }
            if let Some(image) = &item.image {
                params.push((
                    format!("line_items[{i}][price_data][product_data][images][0]"),
                    image.clone(),
                ));
            }
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.price.as_cents().to_string(),
            ));
            params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }

        params
    }
}

impl PaymentGateway for StripeClient {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_session(&self, order: &Order) -> Result<CheckoutSession, PaymentError> {
        if order.items.is_empty() {
            return Err(PaymentError::EmptyOrder);
        }

        let params = self.session_params(order);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .bearer_auth(self.inner.secret_key.expose_secret())
            .header("Stripe-Version", &self.inner.api_version)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Surface the provider's diagnostic, never the request (which
            // carries the secret key).
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            tracing::error!(
                status = %status,
                message = %message,
                "Stripe rejected checkout session request"
            );
            return Err(PaymentError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Stripe session response"
            );
            PaymentError::InvalidSession(format!("unparseable session response: {e}"))
        })?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::InvalidSession("session has no redirect url".to_owned()))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use verdant_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

    use crate::models::OrderItem;

    fn test_config() -> StripeConfig {
        StripeConfig {
            secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            api_version: "2025-12-15".to_owned(),
            api_base: "https://api.stripe.com".to_owned(),
        }
    }

    fn order_with_items() -> Order {
        Order {
            id: OrderId::new(31),
            user_id: Some(UserId::new(7)),
            status: OrderStatus::Pending,
            total: Price::from_cents(2500),
            gateway_session_id: None,
            created_at: Utc::now(),
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                product_id: ProductId::new(4),
                quantity: 2,
                price: Price::from_cents(1000),
                name: "Fiddle Leaf Fig".to_owned(),
                description: Some("A tall one".to_owned()),
                image: None,
            }],
        }
    }

    #[test]
    fn params_carry_frozen_prices_and_correlation_metadata() {
        let client = StripeClient::new(&test_config(), "https://shop.example/");
        let params = client.session_params(&order_with_items());

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("metadata[order_id]"), Some("31"));
        assert_eq!(get("metadata[user_id]"), Some("7"));
        assert_eq!(
            get("line_items[0][price_data][unit_amount]"),
            Some("1000")
        );
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(
            get("line_items[0][price_data][product_data][name]"),
            Some("Fiddle Leaf Fig")
        );
        assert_eq!(
            get("success_url"),
            Some("https://shop.example/checkout/success?session_id={CHECKOUT_SESSION_ID}")
        );
    }

    #[test]
    fn guest_orders_omit_user_metadata() {
        let client = StripeClient::new(&test_config(), "https://shop.example");
        let mut order = order_with_items();
        order.user_id = None;

        let params = client.session_params(&order);
        assert!(!params.iter().any(|(k, _)| k == "metadata[user_id]"));
    }

    #[tokio::test]
    async fn empty_order_is_rejected_before_any_request() {
        let client = StripeClient::new(&test_config(), "https://shop.example");
        let mut order = order_with_items();
        order.items.clear();

        let err = client.create_session(&order).await.unwrap_err();
        assert!(matches!(err, PaymentError::EmptyOrder));
    }
}
