//! Storefront handle bundling every service over one gateway.

use std::sync::Arc;

use crate::config::{PaymentConfig, StorefrontConfig};
use crate::gateway::{GatewayError, HttpGateway, RecordGateway};
use crate::services::{
    CartService, OrderService, PaymentSimulator, ProductService, WishlistService,
};

/// Every storefront service, sharing one gateway handle.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    gateway: Arc<dyn RecordGateway>,
    products: ProductService,
    cart: CartService,
    orders: OrderService,
    wishlist: WishlistService,
}

impl Storefront {
    /// Build the services over an existing gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn RecordGateway>, payment: PaymentConfig) -> Self {
        Self {
            inner: Arc::new(StorefrontInner {
                products: ProductService::new(Arc::clone(&gateway)),
                cart: CartService::new(Arc::clone(&gateway)),
                orders: OrderService::new(Arc::clone(&gateway), PaymentSimulator::new(payment)),
                wishlist: WishlistService::new(Arc::clone(&gateway)),
                gateway,
            }),
        }
    }

    /// Build the services over an HTTP gateway described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, GatewayError> {
        let gateway = HttpGateway::new(&config.gateway)?;
        tracing::info!(
            base_url = %config.gateway.base_url,
            project_id = %config.gateway.project_id,
            "Storefront connected to record gateway"
        );
        Ok(Self::new(Arc::new(gateway), config.payment))
    }

    /// The shared gateway handle.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn RecordGateway> {
        &self.inner.gateway
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistService {
        &self.inner.wishlist
    }
}
