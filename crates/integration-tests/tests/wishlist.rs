//! Saving and removing wishlist products.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use atelier_integration_tests::TestStore;
use atelier_storefront::ServiceError;
use atelier_storefront::mapper::wishlist::TABLE;

#[tokio::test]
async fn test_add_is_idempotent() {
    let ctx = TestStore::new().await;
    let wishlist = ctx.store.wishlist();
    let id = ctx.products[3];

    assert!(wishlist.add(id).await.unwrap());
    assert!(!wishlist.add(id).await.unwrap());
    assert_eq!(wishlist.count().await.unwrap(), 1);
    assert!(wishlist.contains(id).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_adds_create_one_row() {
    let ctx = TestStore::new().await;
    let id = ctx.products[3];
    let a = ctx.store.wishlist().clone();
    let b = ctx.store.wishlist().clone();

    let (first, second) = tokio::join!(a.add(id), b.add(id));
    assert!(first.unwrap() ^ second.unwrap());
    assert_eq!(ctx.gateway.records(TABLE).await.len(), 1);
}

#[tokio::test]
async fn test_remove_and_clear() {
    let ctx = TestStore::new().await;
    let wishlist = ctx.store.wishlist();
    for &id in &ctx.products[..3] {
        wishlist.add(id).await.unwrap();
    }

    assert_eq!(
        wishlist.get_all().await.unwrap(),
        vec![ctx.products[2], ctx.products[1], ctx.products[0]]
    );

    assert!(wishlist.remove(ctx.products[1]).await.unwrap());
    assert!(!wishlist.remove(ctx.products[1]).await.unwrap());
    assert_eq!(wishlist.count().await.unwrap(), 2);

    wishlist.clear().await.unwrap();
    assert_eq!(wishlist.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_offline_gateway_is_an_error() {
    let ctx = TestStore::new().await;
    ctx.gateway.go_offline().await;
    let err = ctx.store.wishlist().add(ctx.products[0]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable));
    assert_eq!(err.to_string(), "Service unavailable");
}
