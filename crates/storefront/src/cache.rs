//! Keyed, tagged, time-bounded cache for read queries.
//!
//! Built on `moka` for TTL eviction, with an explicit tag index layered on
//! top. Keys are typed: a [`CacheKey`] variant carries every parameter that
//! affects its query's result, so two reads share an entry exactly when
//! their effective parameters are identical. Tags are coarser than keys: a
//! single write invalidates every affected read without knowing which keys
//! exist.
//!
//! TTL is a staleness bound, not a correctness guarantee; reads may serve
//! data up to TTL old. Mutations must invalidate their tag before the caller
//! observes success, so the next read is guaranteed fresh.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;

use verdant_core::CartToken;

use crate::db::ProductQuery;
use crate::models::{Cart, Category, Product};

/// Default entry lifetime (one hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

const MAX_ENTRIES: u64 = 10_000;

/// Cache key: one variant per cached query, carrying all of its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Product listing for a full parameter set.
    Products(ProductQuery),
    /// Total product count.
    ProductCount,
    /// All categories.
    Categories,
    /// A single category by slug.
    Category { slug: String },
    /// A cart by its token.
    Cart { token: CartToken },
}

impl CacheKey {
    /// The invalidation tags covering this key.
    #[must_use]
    pub fn tags(&self) -> Vec<CacheTag> {
        match self {
            Self::Products(query) => {
                let mut tags = vec![CacheTag::Products];
                if let Some(slug) = &query.category_slug {
                    tags.push(CacheTag::Category(slug.clone()));
                }
                tags
            }
            Self::ProductCount => vec![CacheTag::Products],
            Self::Categories => vec![CacheTag::Categories],
            Self::Category { slug } => vec![CacheTag::Category(slug.clone())],
            Self::Cart { token } => vec![CacheTag::Cart(*token)],
        }
    }
}

/// Coarse invalidation grouping covering potentially many keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// Every product-listing variant and the product count.
    Products,
    /// The category list.
    Categories,
    /// Reads scoped to one category.
    Category(String),
    /// Reads scoped to one cart.
    Cart(CartToken),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Count(i64),
    Categories(Vec<Category>),
    Category(Box<Category>),
    Cart(Box<Cart>),
}

/// TTL cache with explicit tag-based invalidation.
pub struct TaggedCache {
    entries: Cache<CacheKey, CacheValue>,
    // Tag -> keys registered under it. May retain keys whose entries the TTL
    // already evicted; invalidating an absent key is a no-op.
    tag_index: Mutex<HashMap<CacheTag, HashSet<CacheKey>>>,
}

impl TaggedCache {
    /// Create a cache whose entries live at most `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            tag_index: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a cached value.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.entries.get(key).await
    }

    /// Store a value and register the key under its tags.
    pub async fn insert(&self, key: CacheKey, value: CacheValue) {
        {
            let mut index = self
                .tag_index
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            for tag in key.tags() {
                index.entry(tag).or_default().insert(key.clone());
            }
        }
        self.entries.insert(key, value).await;
    }

    /// Drop every entry registered under `tag`, regardless of remaining TTL.
    /// The next read for any of those keys recomputes from storage.
    pub async fn invalidate(&self, tag: &CacheTag) {
        let keys = {
            let mut index = self
                .tag_index
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            index.remove(tag).unwrap_or_default()
        };
        for key in keys {
            self.entries.invalidate(&key).await;
        }
    }
}

impl Default for TaggedCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products_key(page: u32) -> CacheKey {
        CacheKey::Products(ProductQuery {
            page,
            ..ProductQuery::default()
        })
    }

    #[tokio::test]
    async fn distinct_parameters_are_distinct_keys() {
        let cache = TaggedCache::default();
        cache
            .insert(products_key(1), CacheValue::Count(1))
            .await;
        cache
            .insert(products_key(2), CacheValue::Count(2))
            .await;

        let Some(CacheValue::Count(one)) = cache.get(&products_key(1)).await else {
            panic!("expected page 1 entry");
        };
        let Some(CacheValue::Count(two)) = cache.get(&products_key(2)).await else {
            panic!("expected page 2 entry");
        };
        assert_eq!((one, two), (1, 2));
    }

    #[tokio::test]
    async fn tag_invalidation_drops_all_covered_keys() {
        let cache = TaggedCache::default();
        cache.insert(products_key(1), CacheValue::Count(1)).await;
        cache.insert(products_key(2), CacheValue::Count(2)).await;
        cache
            .insert(CacheKey::ProductCount, CacheValue::Count(99))
            .await;
        cache
            .insert(CacheKey::Categories, CacheValue::Categories(vec![]))
            .await;

        cache.invalidate(&CacheTag::Products).await;

        assert!(cache.get(&products_key(1)).await.is_none());
        assert!(cache.get(&products_key(2)).await.is_none());
        assert!(cache.get(&CacheKey::ProductCount).await.is_none());
        // Categories carry a different tag and survive.
        assert!(cache.get(&CacheKey::Categories).await.is_some());
    }

    #[tokio::test]
    async fn cart_tags_are_scoped_per_token() {
        let cache = TaggedCache::default();
        let a = CartToken::generate();
        let b = CartToken::generate();
        cache
            .insert(CacheKey::Cart { token: a }, CacheValue::Count(1))
            .await;
        cache
            .insert(CacheKey::Cart { token: b }, CacheValue::Count(2))
            .await;

        cache.invalidate(&CacheTag::Cart(a)).await;

        assert!(cache.get(&CacheKey::Cart { token: a }).await.is_none());
        assert!(cache.get(&CacheKey::Cart { token: b }).await.is_some());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = TaggedCache::new(Duration::from_millis(50));
        cache
            .insert(CacheKey::ProductCount, CacheValue::Count(5))
            .await;
        assert!(cache.get(&CacheKey::ProductCount).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get(&CacheKey::ProductCount).await.is_none());
    }

    #[test]
    fn category_filtered_listing_carries_category_tag() {
        let key = CacheKey::Products(ProductQuery {
            category_slug: Some("plants".to_owned()),
            ..ProductQuery::default()
        });
        let tags = key.tags();
        assert!(tags.contains(&CacheTag::Products));
        assert!(tags.contains(&CacheTag::Category("plants".to_owned())));
    }
}
