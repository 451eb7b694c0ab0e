//! Domain models for the storefront.
//!
//! These types are what services hand to callers. They never carry raw
//! gateway field names; the [`crate::mapper`] module converts between them
//! and the flat records stored remotely.

pub mod cart;
pub mod order;
pub mod product;
pub mod wishlist;

pub use cart::{CartItem, NewCartItem};
pub use order::{
    NewOrder, Order, OrderLine, PaymentReceipt, PaymentRequest, ShippingAddress, Tracking,
    TrackingEvent,
};
pub use product::Product;
pub use wishlist::WishlistEntry;
