//! Integration tests for cached catalog reads and tag invalidation.

use verdant_core::Price;
use verdant_integration_tests::TestContext;
use verdant_storefront::cache::CacheTag;
use verdant_storefront::db::{ProductQuery, ProductSort};
use verdant_storefront::services::CatalogService;

#[tokio::test]
async fn cached_listings_are_stale_until_invalidated() {
    let ctx = TestContext::new().await;
    ctx.seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;

    let catalog = CatalogService::new(&ctx.pool, &ctx.cache);
    let query = ProductQuery::default();

    let first = catalog.get_products_cached(&query).await.unwrap();
    assert_eq!(first.len(), 1);

    // A write the cache does not know about leaves the cached copy stale
    ctx.seed_product("Moss", "moss", Price::from_cents(500), None)
        .await;
    let stale = catalog.get_products_cached(&query).await.unwrap();
    assert_eq!(stale.len(), 1, "cached listing must not see the new row");

    // Invalidating the coarse tag flushes every listing key
    ctx.cache.invalidate(&CacheTag::Products).await;
    let fresh = catalog.get_products_cached(&query).await.unwrap();
    assert_eq!(fresh.len(), 2);
}

#[tokio::test]
async fn different_query_parameters_are_cached_separately() {
    let ctx = TestContext::new().await;
    ctx.seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;
    ctx.seed_product("Moss", "moss", Price::from_cents(500), None)
        .await;

    let catalog = CatalogService::new(&ctx.pool, &ctx.cache);

    let all = catalog
        .get_products_cached(&ProductQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let searched = catalog
        .get_products_cached(&ProductQuery {
            search: Some("fern".to_owned()),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.len(), 1, "search results get their own cache key");

    let sorted = catalog
        .get_products_cached(&ProductQuery {
            sort: Some(ProductSort::PriceAsc),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(sorted[0].slug, "moss", "cheapest first");
}

#[tokio::test]
async fn product_count_is_cached_under_the_products_tag() {
    let ctx = TestContext::new().await;
    ctx.seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;

    let catalog = CatalogService::new(&ctx.pool, &ctx.cache);
    assert_eq!(catalog.get_product_count_cached().await.unwrap(), 1);

    ctx.seed_product("Moss", "moss", Price::from_cents(500), None)
        .await;
    assert_eq!(
        catalog.get_product_count_cached().await.unwrap(),
        1,
        "count is served from cache"
    );

    ctx.cache.invalidate(&CacheTag::Products).await;
    assert_eq!(catalog.get_product_count_cached().await.unwrap(), 2);
}

#[tokio::test]
async fn category_listings_use_their_own_tags() {
    let ctx = TestContext::new().await;
    let greens = ctx.seed_category("Greens", "greens").await;
    ctx.seed_product("Fern", "fern", Price::from_cents(1000), Some(greens))
        .await;

    let catalog = CatalogService::new(&ctx.pool, &ctx.cache);

    let category = catalog
        .get_category_by_slug_cached("greens")
        .await
        .unwrap()
        .expect("category should exist");
    assert_eq!(category.name, "Greens");

    let missing = catalog
        .get_category_by_slug_cached("no-such-category")
        .await
        .unwrap();
    assert!(missing.is_none());

    let listing = catalog
        .get_products_cached(&ProductQuery {
            category_slug: Some("greens".to_owned()),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(listing.len(), 1);

    // Invalidating the products tag also covers category-filtered listings
    ctx.seed_product("Ivy", "ivy", Price::from_cents(800), Some(greens))
        .await;
    ctx.cache.invalidate(&CacheTag::Products).await;
    let listing = catalog
        .get_products_cached(&ProductQuery {
            category_slug: Some("greens".to_owned()),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(listing.len(), 2);
}

#[tokio::test]
async fn pagination_respects_page_and_size() {
    let ctx = TestContext::new().await;
    for i in 1..=5i64 {
        ctx.seed_product(
            &format!("Plant {i}"),
            &format!("plant-{i}"),
            Price::from_cents(i * 100),
            None,
        )
        .await;
    }

    let catalog = CatalogService::new(&ctx.pool, &ctx.cache);

    let page1 = catalog
        .get_products_cached(&ProductQuery {
            page: 1,
            page_size: 3,
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page1.len(), 3);

    let page2 = catalog
        .get_products_cached(&ProductQuery {
            page: 2,
            page_size: 3,
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page2.len(), 2);
    assert!(page1.iter().all(|p| page2.iter().all(|q| q.id != p.id)));
}
