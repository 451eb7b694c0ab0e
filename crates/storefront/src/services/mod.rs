//! Storefront services.
//!
//! # Services
//!
//! - `products` - Catalog listing, lookup, featured/related products, categories
//! - `cart` - Cart lines with one line per variant
//! - `orders` - Order placement, listing, tracking and status updates
//! - `payment` - Simulated payment processing
//! - `wishlist` - Saved products, one entry per product
//!
//! Every service holds the same `Arc<dyn RecordGateway>` and returns
//! [`crate::error::Result`]. Gateway failures are logged here, at the
//! service boundary, and folded into [`ServiceError`].

pub mod cart;
pub mod orders;
pub mod payment;
pub mod products;
pub mod wishlist;

pub use cart::CartService;
pub use orders::OrderService;
pub use payment::PaymentSimulator;
pub use products::ProductService;
pub use wishlist::WishlistService;

use crate::error::{Result, ServiceError};
use crate::gateway::GatewayError;

/// Attempts of a conditional read-modify-write before giving up.
pub const MAX_CONDITIONAL_ATTEMPTS: u32 = 3;

/// Log a gateway failure and fold it into a [`ServiceError`].
pub(crate) trait GatewayResultExt<T> {
    fn or_fail(self, fallback: &str) -> Result<T>;
}

impl<T> GatewayResultExt<T> for std::result::Result<T, GatewayError> {
    fn or_fail(self, fallback: &str) -> Result<T> {
        self.map_err(|err| {
            tracing::error!(error = %err, "{fallback}");
            ServiceError::gateway(err, fallback)
        })
    }
}
