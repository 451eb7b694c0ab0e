//! Cart lines.
//!
//! A cart holds at most one line per variant (product, size, color). Adding
//! a variant that is already present bumps that line's quantity instead of
//! inserting a second row. Both steps use the gateway's conditional writes,
//! so two concurrent adds of the same variant end up as one line carrying
//! the summed quantity.

use std::sync::Arc;

use atelier_core::{CartItemId, RecordId, saturating_total, saturating_units};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use super::{GatewayResultExt, MAX_CONDITIONAL_ATTEMPTS};
use crate::error::{Result, ServiceError};
use crate::gateway::{FetchQuery, ID_FIELD, Record, RecordGateway, SortDirection, UniqueCreate};
use crate::mapper::cart::{
    self, QUANTITY, TABLE, VARIANT_KEY, convert_cart_item, new_cart_item_record, quantity_of,
    quantity_record,
};
use crate::mapper::convert_all;
use crate::models::{CartItem, NewCartItem};
use crate::query::DEFAULT_PAGE_SIZE;

const ADD_FAILED: &str = "Failed to add item to cart";

/// Cart operations over the `cart_item_c` table.
#[derive(Clone)]
pub struct CartService {
    gateway: Arc<dyn RecordGateway>,
}

impl CartService {
    #[must_use]
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self { gateway }
    }

    /// Every cart line, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Vec<CartItem>> {
        let query = FetchQuery::new(cart::FIELDS)
            .order_by(ID_FIELD, SortDirection::Desc)
            .page(DEFAULT_PAGE_SIZE, 0);

        let records = self
            .gateway
            .fetch_records(TABLE, &query)
            .await
            .or_fail("Failed to load cart")?;
        Ok(convert_all(TABLE, &records, convert_cart_item))
    }

    /// Add `item`, merging into an existing line of the same variant.
    ///
    /// Returns the refreshed cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a zero quantity,
    /// `ServiceError::Conflict` if the line kept changing underneath us, or an
    /// error if a gateway call fails.
    #[instrument(skip(self, item), fields(product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add_to_cart(&self, item: NewCartItem) -> Result<Vec<CartItem>> {
        if item.quantity == 0 {
            return Err(ServiceError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }

        let record = new_cart_item_record(&item);

        for attempt in 1..=MAX_CONDITIONAL_ATTEMPTS {
            let existing = match self
                .gateway
                .create_unique(TABLE, record.clone(), VARIANT_KEY)
                .await
                .or_fail(ADD_FAILED)?
            {
                UniqueCreate::Created(id) => {
                    debug!(id = %id, "Inserted cart line");
                    return self.get_cart().await;
                }
                UniqueCreate::Existing(existing) => existing,
            };

            let id = existing
                .id()
                .ok_or_else(|| ServiceError::gateway_message(ADD_FAILED))?;
            let merged = quantity_of(&existing).saturating_add(item.quantity);
            let expected = Record::new().with(QUANTITY, existing.get_or_null(QUANTITY));

            let applied = self
                .gateway
                .update_if(TABLE, quantity_record(id.typed(), merged), expected)
                .await
                .or_fail(ADD_FAILED)?;

            if applied {
                debug!(id = %id, quantity = merged, "Merged into existing cart line");
                return self.get_cart().await;
            }
            warn!(id = %id, attempt, "Cart line changed concurrently, retrying");
        }

        Err(ServiceError::Conflict(format!(
            "cart line for product {} kept changing",
            item.product_id
        )))
    }

    /// Set the quantity of line `id`. A quantity of zero or less removes it.
    ///
    /// Returns the refreshed cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway call fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn update_quantity(&self, id: CartItemId, quantity: i64) -> Result<Vec<CartItem>> {
        let Ok(quantity) = u32::try_from(quantity) else {
            if quantity <= 0 {
                return self.remove(id).await;
            }
            return Err(ServiceError::InvalidInput(format!(
                "quantity {quantity} is too large"
            )));
        };
        if quantity == 0 {
            return self.remove(id).await;
        }

        self.gateway
            .update_records(TABLE, vec![quantity_record(id, quantity)])
            .await
            .or_fail("Failed to update cart item")?;
        self.get_cart().await
    }

    /// Remove line `id`. Returns the refreshed cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway call fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn remove(&self, id: CartItemId) -> Result<Vec<CartItem>> {
        self.gateway
            .delete_records(TABLE, &[id.into()])
            .await
            .or_fail("Failed to remove cart item")?;
        self.get_cart().await
    }

    /// Remove every line with one bulk delete.
    ///
    /// An empty cart issues no delete. A failed delete is not rolled back.
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway call fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Vec<CartItem>> {
        let ids: Vec<RecordId> = self
            .get_cart()
            .await?
            .into_iter()
            .map(|item| item.id.into())
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.gateway
            .delete_records(TABLE, &ids)
            .await
            .or_fail("Failed to clear cart")?;
        debug!(count = ids.len(), "Cleared cart");
        Ok(Vec::new())
    }

    /// Sum of `price * quantity` over every line, saturating on overflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    pub async fn total(&self) -> Result<Decimal> {
        Ok(saturating_total(
            self.get_cart().await?.iter().map(CartItem::line_total),
        ))
    }

    /// Sum of quantities over every line, saturating at `u32::MAX`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    pub async fn item_count(&self) -> Result<u32> {
        Ok(saturating_units(
            self.get_cart().await?.iter().map(|item| item.quantity),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use atelier_core::{Price, ProductId};

    fn item(product: i64, size: &str, quantity: u32) -> NewCartItem {
        NewCartItem {
            product_id: ProductId::new(product),
            product_name: format!("Product {product}"),
            price: Price::from_cents(2500),
            quantity,
            selected_size: size.to_string(),
            selected_color: "Black".to_string(),
        }
    }

    fn service() -> (Arc<InMemoryGateway>, CartService) {
        let gateway = Arc::new(InMemoryGateway::new());
        (gateway.clone(), CartService::new(gateway))
    }

    #[tokio::test]
    async fn test_same_variant_merges() {
        let (_, cart) = service();
        cart.add_to_cart(item(1, "M", 2)).await.unwrap();
        let lines = cart.add_to_cart(item(1, "M", 3)).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_other_size_is_a_new_line() {
        let (_, cart) = service();
        cart.add_to_cart(item(1, "M", 1)).await.unwrap();
        let lines = cart.add_to_cart(item(1, "L", 1)).await.unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_quantity_add_is_rejected() {
        let (gateway, cart) = service();
        let err = cart.add_to_cart(item(1, "M", 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(gateway.calls().await.create, 0);
    }

    #[tokio::test]
    async fn test_update_quantity_non_positive_removes() {
        let (_, cart) = service();
        let lines = cart.add_to_cart(item(1, "M", 2)).await.unwrap();
        let lines = cart.update_quantity(lines[0].id, -1).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empty_cart_skips_delete() {
        let (gateway, cart) = service();
        assert!(cart.clear().await.unwrap().is_empty());
        assert_eq!(gateway.calls().await.delete, 0);
    }

    #[tokio::test]
    async fn test_totals_saturate_on_huge_quantities() {
        let (gateway, cart) = service();
        let line = |quantity: u64| {
            Record::new()
                .with(cart::PRODUCT_ID, 1)
                .with(cart::PRICE, 10)
                .with(QUANTITY, quantity)
        };
        gateway
            .seed(TABLE, vec![line(4_000_000_000), line(400_000_000)])
            .await;

        assert_eq!(cart.item_count().await.unwrap(), u32::MAX);
        assert_eq!(cart.total().await.unwrap(), Decimal::new(44_000_000_000, 0));
    }

    #[tokio::test]
    async fn test_totals() {
        let (_, cart) = service();
        cart.add_to_cart(item(1, "M", 2)).await.unwrap();
        cart.add_to_cart(item(2, "S", 1)).await.unwrap();
        assert_eq!(cart.total().await.unwrap(), Decimal::new(7500, 2));
        assert_eq!(cart.item_count().await.unwrap(), 3);
    }
}
