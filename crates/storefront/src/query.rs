//! Catalog and order listing criteria.
//!
//! Equality and substring predicates go to the gateway as `where` clauses.
//! Size/color membership and the price range cannot be expressed there, so
//! they run client-side on the fetched page, followed by sorting.
//!
//! Only one page of [`DEFAULT_PAGE_SIZE`] rows is ever requested.

use std::cmp::Ordering;

use atelier_core::{OrderStatus, SortKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::gateway::{FetchQuery, Filter, ID_FIELD, SortDirection};
use crate::mapper::{order, product};
use crate::models::Product;

/// Rows requested per listing call.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Treat blank strings as absent.
fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

// =============================================================================
// Products
// =============================================================================

/// Catalog listing criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductCriteria {
    /// Exact category match.
    pub category: Option<String>,
    /// Substring of the product name.
    pub search: Option<String>,
    /// Keep products offered in any of these sizes.
    pub sizes: Vec<String>,
    /// Keep products offered in any of these colors.
    pub colors: Vec<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
    pub sort_by: SortKey,
}

impl ProductCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    #[must_use]
    pub fn search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    #[must_use]
    pub fn sizes(mut self, sizes: &[&str]) -> Self {
        self.sizes = sizes.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn colors(mut self, colors: &[&str]) -> Self {
        self.colors = colors.iter().map(|c| (*c).to_string()).collect();
        self
    }

    #[must_use]
    pub const fn price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    #[must_use]
    pub const fn sort_by(mut self, sort_by: SortKey) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Clauses the gateway evaluates.
    #[must_use]
    pub fn remote_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(category) = non_blank(self.category.as_ref()) {
            filters.push(Filter::equal_to(product::CATEGORY, category));
        }
        if let Some(search) = non_blank(self.search.as_ref()) {
            filters.push(Filter::contains(product::NAME, search));
        }
        filters
    }

    /// The fetch for one page of candidates, newest first.
    #[must_use]
    pub fn fetch_query(&self) -> FetchQuery {
        FetchQuery::new(product::FIELDS)
            .filters(self.remote_filters())
            .order_by(ID_FIELD, SortDirection::Desc)
            .page(DEFAULT_PAGE_SIZE, 0)
    }

    /// Whether `product` passes the client-side predicates.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let price = product.price.amount();
        (self.sizes.is_empty() || product.offers_any_size(&self.sizes))
            && (self.colors.is_empty() || product.offers_any_color(&self.colors))
            && self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
    }

    /// Apply the client-side predicates, then sort.
    #[must_use]
    pub fn refine(&self, mut products: Vec<Product>) -> Vec<Product> {
        products.retain(|product| self.matches(product));
        sort_products(&mut products, self.sort_by);
        products
    }
}

/// Case-insensitive name order, ties broken by exact comparison.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort in place. Stable, so equal keys keep the gateway's recency order.
pub fn sort_products(products: &mut [Product], sort_by: SortKey) {
    match sort_by {
        SortKey::PriceLow => products.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::Name => products.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::Unspecified => {}
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order listing criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderCriteria {
    /// `None` lists every status.
    pub status: Option<OrderStatus>,
    /// Substring of the order number.
    pub search: Option<String>,
}

impl OrderCriteria {
    /// Build criteria from caller-supplied text.
    ///
    /// A missing, blank or `"all"` status means no status filter.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for an unknown status.
    pub fn parse(status: Option<&str>, search: Option<&str>) -> Result<Self, ServiceError> {
        let status = match status.map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(s.parse::<OrderStatus>().map_err(ServiceError::InvalidInput)?),
        };
        Ok(Self {
            status,
            search: search.map(str::to_string),
        })
    }

    /// Clauses the gateway evaluates.
    #[must_use]
    pub fn remote_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(status) = self.status {
            filters.push(Filter::equal_to(order::STATUS, status.as_str()));
        }
        if let Some(search) = non_blank(self.search.as_ref()) {
            filters.push(Filter::contains(order::ORDER_NUMBER, search));
        }
        filters
    }

    /// The fetch for one page of orders, newest first.
    #[must_use]
    pub fn fetch_query(&self) -> FetchQuery {
        FetchQuery::new(order::FIELDS)
            .filters(self.remote_filters())
            .order_by(ID_FIELD, SortDirection::Desc)
            .page(DEFAULT_PAGE_SIZE, 0)
    }
}
