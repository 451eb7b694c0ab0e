//! `cart_item_c` table.

use atelier_core::{CartItemId, ProductId};

use super::{count_field, decimal_value, price_field, reference_field, text_field};
use crate::gateway::{ID_FIELD, Record};
use crate::models::{CartItem, NewCartItem};

pub const TABLE: &str = "cart_item_c";

pub const PRODUCT_ID: &str = "product_id_c";
pub const PRODUCT_NAME: &str = "product_name_c";
pub const PRICE: &str = "price_c";
pub const QUANTITY: &str = "quantity_c";
pub const SELECTED_SIZE: &str = "selected_size_c";
pub const SELECTED_COLOR: &str = "selected_color_c";

pub const FIELDS: &[&str] = &[
    ID_FIELD,
    PRODUCT_ID,
    PRODUCT_NAME,
    PRICE,
    QUANTITY,
    SELECTED_SIZE,
    SELECTED_COLOR,
];

/// Fields identifying a variant; at most one line exists per key.
pub const VARIANT_KEY: &[&str] = &[PRODUCT_ID, SELECTED_SIZE, SELECTED_COLOR];

/// Stored quantity of a cart row. Missing, unparsable or zero reads as 1.
#[must_use]
pub fn quantity_of(record: &Record) -> u32 {
    count_field(record, QUANTITY, 1).max(1)
}

/// Read a cart row. `None` without an `Id` or product reference.
#[must_use]
pub fn convert_cart_item(record: &Record) -> Option<CartItem> {
    Some(CartItem {
        id: record.id()?.typed::<CartItemId>(),
        product_id: ProductId::new(reference_field(record, PRODUCT_ID)?),
        product_name: text_field(record, PRODUCT_NAME),
        price: price_field(record, PRICE),
        quantity: quantity_of(record),
        selected_size: text_field(record, SELECTED_SIZE),
        selected_color: text_field(record, SELECTED_COLOR),
    })
}

/// Flat record for inserting a new line.
#[must_use]
pub fn new_cart_item_record(item: &NewCartItem) -> Record {
    Record::new()
        .with(PRODUCT_ID, item.product_id.as_i64())
        .with(PRODUCT_NAME, item.product_name.as_str())
        .with(PRICE, decimal_value(item.price.amount()))
        .with(QUANTITY, item.quantity)
        .with(SELECTED_SIZE, item.selected_size.as_str())
        .with(SELECTED_COLOR, item.selected_color.as_str())
}

/// Partial record setting the quantity of line `id`.
#[must_use]
pub fn quantity_record(id: CartItemId, quantity: u32) -> Record {
    Record::new()
        .with(ID_FIELD, id.as_i64())
        .with(QUANTITY, quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::Price;
    use serde_json::json;

    #[test]
    fn test_convert_cart_item_with_lookup_reference() {
        let record: Record = serde_json::from_value(json!({
            "Id": 40,
            "product_id_c": {"Id": 9, "Name": "Denim Jacket"},
            "product_name_c": "Denim Jacket",
            "price_c": "120",
            "quantity_c": "2",
            "selected_size_c": "L",
            "selected_color_c": "Indigo"
        }))
        .unwrap();

        let item = convert_cart_item(&record).unwrap();

        assert_eq!(item.id, CartItemId::new(40));
        assert_eq!(item.product_id, ProductId::new(9));
        assert_eq!(item.price, Price::from_cents(12000));
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_quantity_defaults_to_one() {
        let base = Record::new().with(ID_FIELD, 1).with(PRODUCT_ID, 2);
        assert_eq!(convert_cart_item(&base).unwrap().quantity, 1);

        let zero = base.clone().with(QUANTITY, 0);
        assert_eq!(convert_cart_item(&zero).unwrap().quantity, 1);

        let garbage = base.with(QUANTITY, "lots");
        assert_eq!(convert_cart_item(&garbage).unwrap().quantity, 1);
    }

    #[test]
    fn test_missing_product_reference_is_unreadable() {
        let record = Record::new().with(ID_FIELD, 1).with(QUANTITY, 3);
        assert!(convert_cart_item(&record).is_none());
    }

    #[test]
    fn test_new_cart_item_record_has_variant_key() {
        let item = NewCartItem {
            product_id: ProductId::new(5),
            product_name: "Beanie".to_string(),
            price: Price::from_cents(1800),
            quantity: 1,
            selected_size: String::new(),
            selected_color: "Rust".to_string(),
        };
        let record = new_cart_item_record(&item);
        for field in VARIANT_KEY {
            assert!(record.get(field).is_some(), "missing {field}");
        }
        assert!(record.id().is_none());
        assert_eq!(record.get(PRICE), Some(&json!(18.0)));
    }
}
