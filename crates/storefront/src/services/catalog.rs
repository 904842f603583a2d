//! Cached catalog reads.
//!
//! Each cached method derives its key from the full query parameter set and
//! registers the coarse `products`/`categories` tags, so a catalog write can
//! invalidate every affected listing without enumerating keys. Uncached
//! variants exist for reads that must see live storage state.

use sqlx::SqlitePool;
use tracing::{debug, instrument};

use crate::cache::{CacheKey, CacheValue, TaggedCache};
use crate::db::{ProductQuery, ProductRepository, RepositoryError};
use crate::models::{Category, Product, ProductDetail};

/// Service for catalog read operations.
pub struct CatalogService<'a> {
    pool: &'a SqlitePool,
    cache: &'a TaggedCache,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, cache: &'a TaggedCache) -> Self {
        Self { pool, cache }
    }

    /// List products straight from storage.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on storage failure.
    pub async fn get_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(self.pool).list(query).await
    }

    /// List products through the cache (tag `products`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on storage failure.
    #[instrument(skip(self))]
    pub async fn get_products_cached(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, RepositoryError> {
        let key = CacheKey::Products(query.clone());

        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!("cache hit for product listing");
            return Ok(products);
        }

        let products = self.get_products(query).await?;
        self.cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Total product count through the cache (tag `products`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on storage failure.
    #[instrument(skip(self))]
    pub async fn get_product_count_cached(&self) -> Result<i64, RepositoryError> {
        if let Some(CacheValue::Count(count)) = self.cache.get(&CacheKey::ProductCount).await {
            debug!("cache hit for product count");
            return Ok(count);
        }

        let count = ProductRepository::new(self.pool).count().await?;
        self.cache
            .insert(CacheKey::ProductCount, CacheValue::Count(count))
            .await;

        Ok(count)
    }

    /// Product detail by slug. Uncached: detail pages always reflect the
    /// live catalog price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on storage failure.
    pub async fn get_product_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        ProductRepository::new(self.pool).get_by_slug(slug).await
    }

    /// All categories through the cache (tag `categories`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on storage failure.
    #[instrument(skip(self))]
    pub async fn get_all_categories_cached(&self) -> Result<Vec<Category>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            debug!("cache hit for categories");
            return Ok(categories);
        }

        let categories = ProductRepository::new(self.pool).list_categories().await?;
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// A category by slug through the cache (tag `category-{slug}`). A miss
    /// in storage is not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on storage failure.
    #[instrument(skip(self))]
    pub async fn get_category_by_slug_cached(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let key = CacheKey::Category {
            slug: slug.to_owned(),
        };

        if let Some(CacheValue::Category(category)) = self.cache.get(&key).await {
            debug!("cache hit for category");
            return Ok(Some(*category));
        }

        let category = ProductRepository::new(self.pool)
            .get_category_by_slug(slug)
            .await?;

        if let Some(category) = &category {
            self.cache
                .insert(key, CacheValue::Category(Box::new(category.clone())))
                .await;
        }

        Ok(category)
    }
}
