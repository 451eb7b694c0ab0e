//! Wishlist entry.

use atelier_core::{ProductId, WishlistItemId};
use serde::{Deserialize, Serialize};

/// One saved product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub product_id: ProductId,
}
