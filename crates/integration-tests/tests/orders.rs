//! Checkout, order listing and tracking.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use atelier_core::{OrderId, OrderStatus, Price};
use atelier_integration_tests::{TestStore, shipping_address};
use atelier_storefront::ServiceError;
use atelier_storefront::config::PaymentConfig;
use atelier_storefront::models::{NewCartItem, NewOrder, Order, PaymentRequest};
use atelier_storefront::query::OrderCriteria;

async fn place_order(ctx: &TestStore) -> Order {
    let cart = ctx.store.cart();
    for (index, quantity) in [(0, 2), (4, 1)] {
        let product = ctx.store.products().get_by_id(ctx.products[index]).await.unwrap();
        cart.add_to_cart(NewCartItem::for_product(&product, "M", "Sand", quantity))
            .await
            .unwrap();
    }
    let lines = cart.get_cart().await.unwrap();
    let order = NewOrder::from_cart(&lines, shipping_address());
    ctx.store.orders().create_order(order).await.unwrap()
}

#[tokio::test]
async fn test_checkout_flow() {
    let ctx = TestStore::new().await;
    let order = place_order(&ctx).await;

    // 2 x 29.00 + 110.00
    assert_eq!(order.total, Price::from_cents(16800));
    assert_eq!(order.unit_count(), 3);
    assert_eq!(order.status, OrderStatus::Confirmed);

    let receipt = ctx
        .store
        .orders()
        .process_payment(&PaymentRequest {
            amount: order.total,
            order_number: Some(order.order_number.clone()),
        })
        .await
        .unwrap();
    assert_eq!(receipt.amount, order.total);

    ctx.store.cart().clear().await.unwrap();
    assert_eq!(ctx.store.cart().item_count().await.unwrap(), 0);

    let stored = ctx.store.orders().get_order_by_id(order.id).await.unwrap();
    assert_eq!(stored.order_number, order.order_number);
    assert_eq!(stored.items, order.items);
    assert_eq!(stored.shipping_address, shipping_address());
}

#[tokio::test]
async fn test_status_update_appends_exactly_one_event() {
    let ctx = TestStore::new().await;
    let order = place_order(&ctx).await;
    let orders = ctx.store.orders();

    let shipped = orders
        .update_order_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(shipped.tracking.events.len(), 2);

    let delivered = orders
        .update_order_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.tracking.events.len(), 3);
    assert_eq!(delivered.tracking.events[..2], shipped.tracking.events[..]);
    assert_eq!(delivered.tracking.latest().unwrap().status, "Delivered");

    let tracking = orders.get_order_tracking(order.id).await.unwrap();
    assert_eq!(tracking, delivered.tracking);
}

#[tokio::test]
async fn test_concurrent_status_updates_keep_both_events() {
    let ctx = TestStore::new().await;
    let order = place_order(&ctx).await;

    let orders_a = ctx.store.orders().clone();
    let orders_b = ctx.store.orders().clone();
    let (a, b) = tokio::join!(
        orders_a.update_order_status(order.id, OrderStatus::Processing),
        orders_b.update_order_status(order.id, OrderStatus::Shipped),
    );
    a.unwrap();
    b.unwrap();

    let tracking = ctx.store.orders().get_order_tracking(order.id).await.unwrap();
    assert_eq!(tracking.events.len(), 3);
}

#[tokio::test]
async fn test_listing_filters_by_status() {
    let ctx = TestStore::new().await;
    let first = place_order(&ctx).await;
    ctx.store.cart().clear().await.unwrap();
    let second = place_order(&ctx).await;
    ctx.store
        .orders()
        .update_order_status(second.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let orders = ctx.store.orders();
    let all = orders
        .get_user_orders(&OrderCriteria::parse(Some("all"), None).unwrap())
        .await
        .unwrap();
    let ids: Vec<OrderId> = all.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let confirmed = orders
        .get_user_orders(&OrderCriteria::parse(Some("confirmed"), None).unwrap())
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].id, first.id);

    assert!(matches!(
        OrderCriteria::parse(Some("lost"), None),
        Err(ServiceError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let ctx = TestStore::new().await;
    let err = ctx
        .store
        .orders()
        .get_order_by_id(OrderId::new(9000))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("Order")));
}

#[tokio::test]
async fn test_declined_payment() {
    let ctx = TestStore::with_payments(PaymentConfig {
        delay: Duration::ZERO,
        success_rate: 0.0,
    })
    .await;
    let err = ctx
        .store
        .orders()
        .process_payment(&PaymentRequest {
            amount: Price::from_cents(1000),
            order_number: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PaymentDeclined));
}
