//! Catalog queries.

use std::collections::BTreeSet;
use std::sync::Arc;

use atelier_core::ProductId;
use tracing::{debug, instrument};

use super::GatewayResultExt;
use crate::error::{Result, ServiceError};
use crate::gateway::{FetchQuery, Filter, ID_FIELD, RecordGateway, SortDirection};
use crate::mapper::product::{self, TABLE, convert_product};
use crate::mapper::{convert_all, owned_fields, text_field};
use crate::models::Product;
use crate::query::{DEFAULT_PAGE_SIZE, ProductCriteria};

/// Most featured products returned.
pub const FEATURED_LIMIT: u32 = 20;

/// Default number of related products.
pub const DEFAULT_RELATED_LIMIT: usize = 4;

/// Read-only access to the `product_c` table.
#[derive(Clone)]
pub struct ProductService {
    gateway: Arc<dyn RecordGateway>,
}

impl ProductService {
    #[must_use]
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self { gateway }
    }

    /// List products matching `criteria`, newest first unless a sort is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    #[instrument(skip(self, criteria))]
    pub async fn get_all(&self, criteria: &ProductCriteria) -> Result<Vec<Product>> {
        let records = self
            .gateway
            .fetch_records(TABLE, &criteria.fetch_query())
            .await
            .or_fail("Failed to load products")?;

        let products = criteria.refine(convert_all(TABLE, &records, convert_product));
        debug!(fetched = records.len(), kept = products.len(), "Listed products");
        Ok(products)
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no such product exists, or an error
    /// if the gateway call fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_by_id(&self, id: ProductId) -> Result<Product> {
        self.gateway
            .get_record_by_id(TABLE, id.into(), &owned_fields(product::FIELDS))
            .await
            .or_fail("Failed to load product")?
            .as_ref()
            .and_then(convert_product)
            .ok_or(ServiceError::NotFound("Product"))
    }

    /// Featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    #[instrument(skip(self))]
    pub async fn get_featured(&self) -> Result<Vec<Product>> {
        let query = FetchQuery::new(product::FIELDS)
            .filter(Filter::equal_to(product::FEATURED, true))
            .order_by(ID_FIELD, SortDirection::Desc)
            .page(FEATURED_LIMIT, 0);

        let records = self
            .gateway
            .fetch_records(TABLE, &query)
            .await
            .or_fail("Failed to load featured products")?;
        Ok(convert_all(TABLE, &records, convert_product))
    }

    /// Up to `limit` other products from the same category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the source product does not exist,
    /// or an error if a gateway call fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_related(&self, id: ProductId, limit: usize) -> Result<Vec<Product>> {
        let source = self.get_by_id(id).await?;

        // One extra row in case the source product is among them.
        let page = u32::try_from(limit.saturating_add(1)).unwrap_or(u32::MAX);
        let query = FetchQuery::new(product::FIELDS)
            .filter(Filter::equal_to(product::CATEGORY, source.category.as_str()))
            .order_by(ID_FIELD, SortDirection::Desc)
            .page(page, 0);

        let records = self
            .gateway
            .fetch_records(TABLE, &query)
            .await
            .or_fail("Failed to load related products")?;

        Ok(convert_all(TABLE, &records, convert_product)
            .into_iter()
            .filter(|product| product.id != id)
            .take(limit)
            .collect())
    }

    /// Distinct non-blank categories in ascending order.
    ///
    /// Grouping is requested from the gateway, but the result is deduplicated
    /// and sorted here as well since not every gateway honours `groupBy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<String>> {
        let query = FetchQuery::new(&[product::CATEGORY])
            .group_by(product::CATEGORY)
            .order_by(product::CATEGORY, SortDirection::Asc)
            .page(DEFAULT_PAGE_SIZE, 0);

        let records = self
            .gateway
            .fetch_records(TABLE, &query)
            .await
            .or_fail("Failed to load categories")?;

        let categories: BTreeSet<String> = records
            .iter()
            .map(|record| text_field(record, product::CATEGORY).trim().to_string())
            .filter(|category| !category.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }
}
