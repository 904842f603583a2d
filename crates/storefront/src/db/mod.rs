//! Database operations for the storefront SQLite database.
//!
//! ## Tables
//!
//! - `categories` / `products` - catalog (read-only for this service)
//! - `users` - written by the external auth collaborator, read for order
//!   attribution
//! - `carts` / `cart_items` - mutable carts keyed by opaque token
//! - `orders` / `order_items` - immutable checkout snapshots
//!
//! # Migrations
//!
//! Migrations are embedded from `crates/storefront/migrations/` and run at
//! startup via [`MIGRATOR`].

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod carts;
pub mod orders;
pub mod products;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::{DEFAULT_PAGE_SIZE, ProductQuery, ProductRepository, ProductSort};

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., an illegal status transition).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a SQLite connection pool with sensible defaults.
///
/// Foreign key enforcement is enabled on every connection; the cart teardown
/// in the checkout transaction relies on `ON DELETE CASCADE`.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
