//! Shared application state for request handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::cache::TaggedCache;
use crate::config::StorefrontConfig;
use crate::payments::StripeClient;

/// Application state shared across request handlers.
///
/// Cheap to clone; all fields live behind a single `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    cache: TaggedCache,
    payments: StripeClient,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: SqlitePool) -> Self {
        let cache = TaggedCache::new(Duration::from_secs(config.cache_ttl_secs));
        let payments = StripeClient::new(&config.stripe, &config.base_url);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cache,
                payments,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    #[must_use]
    pub fn cache(&self) -> &TaggedCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn payments(&self) -> &StripeClient {
        &self.inner.payments
    }
}
