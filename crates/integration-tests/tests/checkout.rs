//! Integration tests for the cart-to-order checkout pipeline.

use verdant_core::{OrderStatus, Price};
use verdant_integration_tests::{FakeGateway, TestContext};
use verdant_storefront::db::OrderRepository;
use verdant_storefront::services::{CartService, CheckoutError, CheckoutService};

#[tokio::test]
async fn checkout_freezes_the_cart_into_an_order() {
    let ctx = TestContext::new().await;
    let fern = ctx
        .seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;
    let moss = ctx
        .seed_product("Moss", "moss", Price::from_cents(500), None)
        .await;

    let carts = CartService::new(&ctx.pool, &ctx.cache);
    let token = carts.add_to_cart(None, fern, 2).await.unwrap();
    carts.add_to_cart(Some(token), moss, 1).await.unwrap();

    let gateway = FakeGateway::new();
    let checkout = CheckoutService::new(&ctx.pool, &ctx.cache, &gateway);

    let outcome = checkout
        .process_checkout(Some(token), None)
        .await
        .expect("checkout should succeed");

    assert_eq!(outcome.order.total, Price::from_cents(2500));
    assert_eq!(outcome.order.status, OrderStatus::PendingPayment);
    assert_eq!(outcome.order.items.len(), 2);
    assert!(outcome.order.user_id.is_none(), "guest checkout");
    assert!(
        outcome
            .order
            .gateway_session_id
            .as_deref()
            .is_some_and(|id| id.starts_with("cs_test_"))
    );
    assert!(outcome.checkout_url.contains("cs_test_"));
    assert_eq!(gateway.call_count(), 1);

    // The cart is consumed
    assert!(carts.get_cart(Some(token)).await.unwrap().is_none());
}

#[tokio::test]
async fn order_prices_do_not_follow_later_catalog_changes() {
    let ctx = TestContext::new().await;
    let fern = ctx
        .seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;

    let carts = CartService::new(&ctx.pool, &ctx.cache);
    let token = carts.add_to_cart(None, fern, 1).await.unwrap();

    let gateway = FakeGateway::new();
    let outcome = CheckoutService::new(&ctx.pool, &ctx.cache, &gateway)
        .process_checkout(Some(token), None)
        .await
        .unwrap();

    // A catalog price change after checkout must not touch the order
    ctx.set_product_price(fern, Price::from_cents(9900)).await;

    let order = OrderRepository::new(&ctx.pool)
        .get_with_items(outcome.order.id)
        .await
        .unwrap();
    assert_eq!(order.total, Price::from_cents(1000));
    assert_eq!(order.items[0].price, Price::from_cents(1000));
}

#[tokio::test]
async fn checkout_records_the_signed_in_user() {
    let ctx = TestContext::new().await;
    let fern = ctx
        .seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;
    let user = ctx.seed_user("customer@example.com").await;

    let carts = CartService::new(&ctx.pool, &ctx.cache);
    let token = carts.add_to_cart(None, fern, 1).await.unwrap();

    let gateway = FakeGateway::new();
    let outcome = CheckoutService::new(&ctx.pool, &ctx.cache, &gateway)
        .process_checkout(Some(token), Some(user))
        .await
        .unwrap();

    assert_eq!(outcome.order.user_id, Some(user));
}

#[tokio::test]
async fn checkout_without_a_cart_is_rejected() {
    let ctx = TestContext::new().await;
    let gateway = FakeGateway::new();
    let checkout = CheckoutService::new(&ctx.pool, &ctx.cache, &gateway);

    let err = checkout.process_checkout(None, None).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn checkout_of_an_empty_cart_is_rejected() {
    let ctx = TestContext::new().await;
    let fern = ctx
        .seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;

    let carts = CartService::new(&ctx.pool, &ctx.cache);
    let token = carts.add_to_cart(None, fern, 1).await.unwrap();
    carts.set_quantity(Some(token), fern, 0).await.unwrap();

    let gateway = FakeGateway::new();
    let err = CheckoutService::new(&ctx.pool, &ctx.cache, &gateway)
        .process_checkout(Some(token), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(gateway.call_count(), 0);

    // No order was created
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test]
async fn gateway_failure_marks_the_order_failed_but_keeps_it() {
    let ctx = TestContext::new().await;
    let fern = ctx
        .seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;

    let carts = CartService::new(&ctx.pool, &ctx.cache);
    let token = carts.add_to_cart(None, fern, 2).await.unwrap();

    let gateway = FakeGateway::failing();
    let err = CheckoutService::new(&ctx.pool, &ctx.cache, &gateway)
        .process_checkout(Some(token), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Gateway(_)));

    // The order is the durable record of the attempt
    let order_id: i64 = sqlx::query_scalar("SELECT id FROM orders")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    let order = OrderRepository::new(&ctx.pool)
        .get_with_items(order_id.into())
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.total, Price::from_cents(2000));
    assert_eq!(order.items.len(), 1, "frozen items survive the failure");
    assert!(order.gateway_session_id.is_none());

    // The cart is consumed even on failure; a retry starts fresh
    assert!(carts.get_cart(Some(token)).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_checkouts_of_one_cart_create_exactly_one_order() {
    let ctx = TestContext::new().await;
    let fern = ctx
        .seed_product("Fern", "fern", Price::from_cents(1000), None)
        .await;

    let carts = CartService::new(&ctx.pool, &ctx.cache);
    let token = carts.add_to_cart(None, fern, 1).await.unwrap();

    let gateway = FakeGateway::new();
    let checkout = CheckoutService::new(&ctx.pool, &ctx.cache, &gateway);

    let (first, second) = tokio::join!(
        checkout.process_checkout(Some(token), None),
        checkout.process_checkout(Some(token), None),
    );

    let successes = [&first, &second]
        .into_iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(successes, 1, "exactly one checkout may win");

    for result in [first, second] {
        if let Err(err) = result {
            assert!(matches!(err, CheckoutError::EmptyCart));
        }
    }

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(orders, 1);
    assert_eq!(gateway.call_count(), 1);
}
