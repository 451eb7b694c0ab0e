//! Catalog product.

use atelier_core::{Price, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price, never negative.
    pub price: Price,
    pub category: String,
    pub subcategory: String,
    /// Image URLs in display order.
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    /// Units on hand, never negative.
    pub stock: u32,
    pub featured: bool,
}

impl Product {
    /// Whether at least one unit is on hand.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// The first image, used for listings.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether the product is offered in any of `sizes`.
    #[must_use]
    pub fn offers_any_size(&self, sizes: &[String]) -> bool {
        sizes.iter().any(|size| self.sizes.contains(size))
    }

    /// Whether the product is offered in any of `colors`.
    #[must_use]
    pub fn offers_any_color(&self, colors: &[String]) -> bool {
        colors.iter().any(|color| self.colors.contains(color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tee() -> Product {
        Product {
            id: ProductId::new(7),
            name: "Boxy Tee".to_string(),
            description: String::new(),
            price: Price::from_cents(2900),
            category: "Tops".to_string(),
            subcategory: "T-Shirts".to_string(),
            images: vec!["front.jpg".to_string(), "back.jpg".to_string()],
            sizes: vec!["S".to_string(), "M".to_string()],
            colors: vec!["Black".to_string()],
            stock: 0,
            featured: false,
        }
    }

    #[test]
    fn test_any_of_membership() {
        let product = tee();
        assert!(product.offers_any_size(&["XL".to_string(), "M".to_string()]));
        assert!(!product.offers_any_size(&["XL".to_string()]));
        assert!(product.offers_any_color(&["Black".to_string()]));
        assert!(!product.offers_any_color(&["black".to_string()]));
    }

    #[test]
    fn test_listing_helpers() {
        let product = tee();
        assert!(!product.in_stock());
        assert_eq!(product.primary_image(), Some("front.jpg"));
    }
}
