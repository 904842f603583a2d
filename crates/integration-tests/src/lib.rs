//! Integration test support for Verdant.
//!
//! Service- and repository-level tests run against an in-memory `SQLite`
//! database created per test; no external services are needed. The
//! HTTP-level tests in `tests/http_api.rs` instead target a running
//! storefront server and are `#[ignore]`d by default.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use verdant_core::{CategoryId, Price, ProductId, UserId};
use verdant_storefront::cache::TaggedCache;
use verdant_storefront::db::MIGRATOR;
use verdant_storefront::models::Order;
use verdant_storefront::payments::{CheckoutSession, PaymentError, PaymentGateway};

/// A per-test database plus a tagged cache, mirroring the state the
/// storefront services run against in production.
pub struct TestContext {
    pub pool: SqlitePool,
    pub cache: TaggedCache,
}

impl TestContext {
    /// Create a fresh in-memory database with the schema applied.
    ///
    /// The pool is pinned to a single connection so every query sees the
    /// same in-memory database.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created or migrated; tests cannot
    /// proceed without it.
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("valid sqlite url")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .expect("failed to open in-memory database");

        MIGRATOR.run(&pool).await.expect("failed to run migrations");

        Self {
            pool,
            cache: TaggedCache::new(Duration::from_secs(3600)),
        }
    }

    /// Insert a category and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn seed_category(&self, name: &str, slug: &str) -> CategoryId {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO categories (name, slug) VALUES (?, ?) RETURNING id")
                .bind(name)
                .bind(slug)
                .fetch_one(&self.pool)
                .await
                .expect("failed to seed category");
        CategoryId::new(id)
    }

    /// Insert a product and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn seed_product(
        &self,
        name: &str,
        slug: &str,
        price: Price,
        category_id: Option<CategoryId>,
    ) -> ProductId {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, slug, description, image, price_cents, category_id) \
             VALUES (?, ?, NULL, NULL, ?, ?) \
             RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .bind(price)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .expect("failed to seed product");
        ProductId::new(id)
    }

    /// Insert a user and return their id.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn seed_user(&self, email: &str) -> UserId {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO users (name, email) VALUES (NULL, ?) RETURNING id")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .expect("failed to seed user");
        UserId::new(id)
    }

    /// Overwrite a product's catalog price.
    ///
    /// # Panics
    ///
    /// Panics if the update fails.
    pub async fn set_product_price(&self, product_id: ProductId, price: Price) {
        sqlx::query("UPDATE products SET price_cents = ? WHERE id = ?")
            .bind(price)
            .bind(product_id)
            .execute(&self.pool)
            .await
            .expect("failed to update product price");
    }
}

/// In-process payment gateway stand-in.
///
/// Succeeds with a deterministic session unless constructed with
/// [`FakeGateway::failing`], and counts how many times it was called.
pub struct FakeGateway {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeGateway {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A gateway whose every call fails with a provider error.
    #[must_use]
    pub const fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `create_session` calls observed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_session(&self, order: &Order) -> Result<CheckoutSession, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(PaymentError::Provider {
                status: 503,
                message: "provider unavailable".to_owned(),
            });
        }

        Ok(CheckoutSession {
            id: format!("cs_test_{}", order.id),
            url: format!("https://pay.example/session/cs_test_{}", order.id),
        })
    }
}
