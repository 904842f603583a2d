//! Catalog repository.
//!
//! Read-only queries over products and categories. Listing supports search,
//! category filtering, price sorting, and pagination; the full parameter set
//! also forms the cache key for the cached read path (see `cache`).

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::{Category, Product, ProductDetail};

use super::RepositoryError;

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 3;

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Parse the wire form used by listing requests (`price-asc`,
    /// `price-desc`). Unknown values mean default ordering.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "price-asc" => Some(Self::PriceAsc),
            "price-desc" => Some(Self::PriceDesc),
            _ => None,
        }
    }
}

/// Parameters for a product listing query.
///
/// Every field affects the result set, so this struct doubles as the cache
/// key for cached listings: identical parameters, identical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    /// Case-insensitive substring match on name or description.
    pub search: Option<String>,
    /// Restrict to products in the category with this slug.
    pub category_slug: Option<String>,
    /// Price sort; `None` means default (insertion) order.
    pub sort: Option<ProductSort>,
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            category_slug: None,
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Repository for catalog read operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List products matching the query parameters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT id, name, slug, description, image, price_cents, category_id FROM products",
        );

        let mut has_where = false;
        if let Some(search) = &query.search {
            let pattern = format!("%{search}%");
            builder.push(" WHERE (name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description LIKE ");
            builder.push_bind(pattern);
            builder.push(")");
            has_where = true;
        }

        if let Some(slug) = &query.category_slug {
            builder.push(if has_where { " AND " } else { " WHERE " });
            builder.push("category_id = (SELECT id FROM categories WHERE slug = ");
            builder.push_bind(slug.clone());
            builder.push(")");
        }

        match query.sort {
            Some(ProductSort::PriceAsc) => builder.push(" ORDER BY price_cents ASC"),
            Some(ProductSort::PriceDesc) => builder.push(" ORDER BY price_cents DESC"),
            None => builder.push(" ORDER BY id ASC"),
        };

        let page = query.page.max(1);
        let offset = i64::from(query.page_size) * i64::from(page - 1);
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(query.page_size));
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// Total number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Get a product by its slug, with its category joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, slug, description, image, price_cents, category_id \
             FROM products WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        let category = match product.category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE id = ?")
                    .bind(category_id)
                    .fetch_optional(self.pool)
                    .await?
            }
            None => None,
        };

        Ok(Some(ProductDetail { product, category }))
    }

    /// All categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories ORDER BY name ASC")
                .fetch_all(self.pool)
                .await?;
        Ok(categories)
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = ?")
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;
        Ok(category)
    }
}
