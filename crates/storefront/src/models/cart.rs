//! Cart lines.

use atelier_core::{CartItemId, Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Product;

/// A stored cart line.
///
/// There is at most one line per variant: product, size and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Price,
    /// Always at least 1.
    pub quantity: u32,
    pub selected_size: String,
    pub selected_color: String,
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }

    /// Whether this line holds the same variant as `item`.
    #[must_use]
    pub fn is_variant_of(&self, item: &NewCartItem) -> bool {
        self.product_id == item.product_id
            && self.selected_size == item.selected_size
            && self.selected_color == item.selected_color
    }
}

/// A line to add to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub selected_size: String,
    #[serde(default)]
    pub selected_color: String,
}

impl NewCartItem {
    /// A line for `quantity` units of one variant of `product`.
    #[must_use]
    pub fn for_product(product: &Product, size: &str, color: &str, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            quantity,
            selected_size: size.to_string(),
            selected_color: color.to_string(),
        }
    }
}
