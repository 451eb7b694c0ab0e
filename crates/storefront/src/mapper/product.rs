//! `product_c` table.

use atelier_core::ProductId;

use super::{
    IMAGE_DELIMITER, OPTION_DELIMITER, bool_field, count_field, decimal_value, join_list,
    list_field, price_field, text_field,
};
use crate::gateway::{ID_FIELD, Record};
use crate::models::Product;

pub const TABLE: &str = "product_c";

pub const NAME: &str = "name_c";
pub const DESCRIPTION: &str = "description_c";
pub const PRICE: &str = "price_c";
pub const CATEGORY: &str = "category_c";
pub const SUBCATEGORY: &str = "subcategory_c";
pub const IMAGES: &str = "images_c";
pub const SIZES: &str = "sizes_c";
pub const COLORS: &str = "colors_c";
pub const STOCK: &str = "stock_c";
pub const FEATURED: &str = "featured_c";

/// Every field a product read projects.
pub const FIELDS: &[&str] = &[
    ID_FIELD,
    NAME,
    DESCRIPTION,
    PRICE,
    CATEGORY,
    SUBCATEGORY,
    IMAGES,
    SIZES,
    COLORS,
    STOCK,
    FEATURED,
];

/// Read a product row. `None` when the row has no usable `Id`.
#[must_use]
pub fn convert_product(record: &Record) -> Option<Product> {
    Some(Product {
        id: record.id()?.typed::<ProductId>(),
        name: text_field(record, NAME),
        description: text_field(record, DESCRIPTION),
        price: price_field(record, PRICE),
        category: text_field(record, CATEGORY),
        subcategory: text_field(record, SUBCATEGORY),
        images: list_field(record, IMAGES, IMAGE_DELIMITER),
        sizes: list_field(record, SIZES, OPTION_DELIMITER),
        colors: list_field(record, COLORS, OPTION_DELIMITER),
        stock: count_field(record, STOCK, 0),
        featured: bool_field(record, FEATURED),
    })
}

/// Flat record for a product, including its `Id`.
#[must_use]
pub fn product_record(product: &Product) -> Record {
    Record::new()
        .with(ID_FIELD, product.id.as_i64())
        .with(NAME, product.name.as_str())
        .with(DESCRIPTION, product.description.as_str())
        .with(PRICE, decimal_value(product.price.amount()))
        .with(CATEGORY, product.category.as_str())
        .with(SUBCATEGORY, product.subcategory.as_str())
        .with(IMAGES, join_list(&product.images, IMAGE_DELIMITER))
        .with(SIZES, join_list(&product.sizes, OPTION_DELIMITER))
        .with(COLORS, join_list(&product.colors, OPTION_DELIMITER))
        .with(STOCK, product.stock)
        .with(FEATURED, product.featured)
}
