//! Catalog route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{DEFAULT_PAGE_SIZE, ProductQuery, ProductSort};
use crate::error::AppError;
use crate::models::{Category, Product, ProductDetail};
use crate::services::CatalogService;
use crate::state::AppState;

/// Query string parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Substring search over name and description.
    pub q: Option<String>,
    /// Category slug filter.
    pub category: Option<String>,
    /// `price-asc` or `price-desc`; anything else means default order.
    pub sort: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl From<ListParams> for ProductQuery {
    fn from(params: ListParams) -> Self {
        Self {
            search: params.q.filter(|q| !q.is_empty()),
            category_slug: params.category.filter(|c| !c.is_empty()),
            sort: params.sort.as_deref().and_then(ProductSort::parse),
            page: params.page.unwrap_or(1).max(1),
            page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100),
        }
    }
}

/// Product listing response.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    /// Total products in the catalog, for pager rendering.
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

/// List products with search, category filter, price sort, and pagination.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductListResponse>, AppError> {
    let query = ProductQuery::from(params);
    let catalog = CatalogService::new(state.pool(), state.cache());

    let products = catalog.get_products_cached(&query).await?;
    let total_count = catalog.get_product_count_cached().await?;

    Ok(Json(ProductListResponse {
        products,
        total_count,
        page: query.page,
        page_size: query.page_size,
    }))
}

/// Product detail by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>, AppError> {
    let catalog = CatalogService::new(state.pool(), state.cache());

    let detail = catalog
        .get_product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {slug}")))?;

    Ok(Json(detail))
}

/// Category listing.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let catalog = CatalogService::new(state.pool(), state.cache());
    Ok(Json(catalog.get_all_categories_cached().await?))
}

/// Category detail response: the category plus its first page of products.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Category detail by slug.
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let catalog = CatalogService::new(state.pool(), state.cache());

    let category = catalog
        .get_category_by_slug_cached(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category not found: {slug}")))?;

    let query = ProductQuery {
        category_slug: Some(slug),
        ..ProductQuery::default()
    };
    let products = catalog.get_products_cached(&query).await?;

    Ok(Json(CategoryResponse { category, products }))
}
