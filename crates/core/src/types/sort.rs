//! Catalog sort keys.

use serde::{Deserialize, Serialize};

/// Client-side ordering applied to a product listing.
///
/// Parsed from the storefront's query-string values (`price-low`,
/// `price-high`, `name`). Anything else leaves the gateway order untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Ascending price.
    PriceLow,
    /// Descending price.
    PriceHigh,
    /// Name, A to Z.
    Name,
    /// Keep the order the gateway returned (newest first).
    #[default]
    #[serde(other)]
    Unspecified,
}

impl SortKey {
    /// Parse a sort key, falling back to [`SortKey::Unspecified`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "price-low" => Self::PriceLow,
            "price-high" => Self::PriceHigh,
            "name" => Self::Name,
            _ => Self::Unspecified,
        }
    }
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_keys() {
        assert_eq!(SortKey::parse("price-low"), SortKey::PriceLow);
        assert_eq!(SortKey::parse("price-high"), SortKey::PriceHigh);
        assert_eq!(SortKey::parse("name"), SortKey::Name);
    }

    #[test]
    fn test_unknown_key_is_unspecified() {
        assert_eq!(SortKey::parse("rating"), SortKey::Unspecified);
        assert_eq!(SortKey::from(""), SortKey::Unspecified);
    }
}
