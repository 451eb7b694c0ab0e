//! `wishlist_item_c` table.

use atelier_core::{ProductId, WishlistItemId};

use super::reference_field;
use crate::gateway::{ID_FIELD, Record};
use crate::models::WishlistEntry;

pub const TABLE: &str = "wishlist_item_c";

pub const PRODUCT_ID: &str = "product_id_c";

pub const FIELDS: &[&str] = &[ID_FIELD, PRODUCT_ID];

/// A product appears at most once on the wishlist.
pub const UNIQUE_KEY: &[&str] = &[PRODUCT_ID];

/// Read a wishlist row. `None` without an `Id` or product reference.
#[must_use]
pub fn convert_wishlist_entry(record: &Record) -> Option<WishlistEntry> {
    Some(WishlistEntry {
        id: record.id()?.typed::<WishlistItemId>(),
        product_id: ProductId::new(reference_field(record, PRODUCT_ID)?),
    })
}

/// Flat record for saving `product_id`.
#[must_use]
pub fn wishlist_record(product_id: ProductId) -> Record {
    Record::new().with(PRODUCT_ID, product_id.as_i64())
}
