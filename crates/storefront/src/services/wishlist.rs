//! Saved products.

use std::sync::Arc;

use atelier_core::{ProductId, RecordId};
use tracing::{debug, instrument};

use super::GatewayResultExt;
use crate::error::Result;
use crate::gateway::{FetchQuery, Filter, ID_FIELD, RecordGateway, SortDirection, UniqueCreate};
use crate::mapper::convert_all;
use crate::mapper::wishlist::{
    self, PRODUCT_ID, TABLE, UNIQUE_KEY, convert_wishlist_entry, wishlist_record,
};
use crate::models::WishlistEntry;
use crate::query::DEFAULT_PAGE_SIZE;

const LOAD_FAILED: &str = "Failed to load wishlist";

/// Wishlist operations over the `wishlist_item_c` table.
#[derive(Clone)]
pub struct WishlistService {
    gateway: Arc<dyn RecordGateway>,
}

impl WishlistService {
    #[must_use]
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self { gateway }
    }

    fn lookup(product_id: ProductId) -> FetchQuery {
        FetchQuery::new(wishlist::FIELDS)
            .filter(Filter::equal_to(PRODUCT_ID, product_id.as_i64()))
            .page(1, 0)
    }

    /// Every entry, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    #[instrument(skip(self))]
    pub async fn entries(&self) -> Result<Vec<WishlistEntry>> {
        let query = FetchQuery::new(wishlist::FIELDS)
            .order_by(ID_FIELD, SortDirection::Desc)
            .page(DEFAULT_PAGE_SIZE, 0);

        let records = self
            .gateway
            .fetch_records(TABLE, &query)
            .await
            .or_fail(LOAD_FAILED)?;
        Ok(convert_all(TABLE, &records, convert_wishlist_entry))
    }

    /// Saved product IDs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    pub async fn get_all(&self) -> Result<Vec<ProductId>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|entry| entry.product_id)
            .collect())
    }

    /// Save `product_id`. Returns `false` if it was already saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: ProductId) -> Result<bool> {
        let outcome = self
            .gateway
            .create_unique(TABLE, wishlist_record(product_id), UNIQUE_KEY)
            .await
            .or_fail("Failed to add item to wishlist")?;

        let added = matches!(outcome, UniqueCreate::Created(_));
        debug!(added, "Wishlist add");
        Ok(added)
    }

    /// Remove `product_id`. Returns `false` if it was not saved.
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: ProductId) -> Result<bool> {
        const REMOVE_FAILED: &str = "Failed to remove item from wishlist";

        let records = self
            .gateway
            .fetch_records(TABLE, &Self::lookup(product_id))
            .await
            .or_fail(REMOVE_FAILED)?;

        let Some(id) = records.first().and_then(|record| record.id()) else {
            debug!("Product not on wishlist");
            return Ok(false);
        };

        self.gateway
            .delete_records(TABLE, &[id])
            .await
            .or_fail(REMOVE_FAILED)?;
        Ok(true)
    }

    /// Whether `product_id` is saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn contains(&self, product_id: ProductId) -> Result<bool> {
        let records = self
            .gateway
            .fetch_records(TABLE, &Self::lookup(product_id))
            .await
            .or_fail(LOAD_FAILED)?;
        Ok(!records.is_empty())
    }

    /// Remove every entry. An empty wishlist issues no delete.
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway call fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let ids: Vec<RecordId> = self
            .entries()
            .await?
            .into_iter()
            .map(|entry| entry.id.into())
            .collect();
        if ids.is_empty() {
            return Ok(());
        }

        self.gateway
            .delete_records(TABLE, &ids)
            .await
            .or_fail("Failed to clear wishlist")?;
        Ok(())
    }

    /// Number of saved products.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.entries().await?.len())
    }
}
