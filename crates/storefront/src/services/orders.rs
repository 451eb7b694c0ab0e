//! Order placement, lookup and tracking.

use std::sync::Arc;

use atelier_core::{OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use super::{GatewayResultExt, MAX_CONDITIONAL_ATTEMPTS, PaymentSimulator};
use crate::error::{Result, ServiceError};
use crate::gateway::{CreateResult, Record, RecordGateway};
use crate::mapper::order::{
    self, TABLE, TRACKING, convert_order, new_order_record, raw_tracking, status_record,
    stored_tracking,
};
use crate::mapper::{convert_all, owned_fields};
use crate::models::order::DEFAULT_CARRIER;
use crate::models::{NewOrder, Order, PaymentReceipt, PaymentRequest, Tracking, TrackingEvent};
use crate::query::OrderCriteria;

const CREATE_FAILED: &str = "Failed to create order";
const UPDATE_FAILED: &str = "Failed to update order status";

/// Location of the first tracking event.
pub const PLACED_LOCATION: &str = "Online";

/// Location of every status-change tracking event.
pub const WAREHOUSE_LOCATION: &str = "Warehouse";

/// `VT` plus the last six digits of the epoch-millisecond clock.
///
/// Collisions are unlikely but possible.
#[must_use]
pub fn order_number(millis: i64) -> String {
    format!("VT{:06}", millis.rem_euclid(1_000_000))
}

/// `TRK` plus the last eight digits of the epoch-millisecond clock.
#[must_use]
pub fn tracking_number(millis: i64) -> String {
    format!("TRK{:08}", millis.rem_euclid(100_000_000))
}

/// Tracking record for an order placed at `now`.
fn initial_tracking(now: DateTime<Utc>) -> Tracking {
    Tracking {
        carrier: DEFAULT_CARRIER.to_string(),
        tracking_number: tracking_number(now.timestamp_millis()),
        events: vec![TrackingEvent::new(now, "Order placed", PLACED_LOCATION)],
    }
}

fn encode_error(err: &serde_json::Error) -> ServiceError {
    ServiceError::InvalidInput(format!("order could not be encoded: {err}"))
}

/// Orders over the `order_c` table, plus payment simulation.
#[derive(Clone)]
pub struct OrderService {
    gateway: Arc<dyn RecordGateway>,
    payments: PaymentSimulator,
}

impl OrderService {
    #[must_use]
    pub fn new(gateway: Arc<dyn RecordGateway>, payments: PaymentSimulator) -> Self {
        Self { gateway, payments }
    }

    /// Place an order with status `confirmed` and a fresh tracking record.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the order or the call fails.
    #[instrument(skip(self, new_order), fields(lines = new_order.items.len(), total = %new_order.total))]
    pub async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let now = Utc::now();
        let number = order_number(now.timestamp_millis());
        let tracking = initial_tracking(now);

        let record =
            new_order_record(&new_order, &number, now, &tracking).map_err(|e| encode_error(&e))?;

        let results = self
            .gateway
            .create_records(TABLE, vec![record])
            .await
            .or_fail(CREATE_FAILED)?;

        let stored = match results.into_iter().next() {
            Some(CreateResult::Created(stored)) => stored,
            Some(CreateResult::Failed(message)) => {
                warn!(message = ?message, "Gateway refused order");
                return Err(ServiceError::gateway_message(
                    message.unwrap_or_else(|| CREATE_FAILED.to_string()),
                ));
            }
            None => return Err(ServiceError::gateway_message(CREATE_FAILED)),
        };
        let id = stored
            .id()
            .ok_or_else(|| ServiceError::gateway_message(CREATE_FAILED))?
            .typed::<OrderId>();

        info!(id = %id, order_number = %number, "Order placed");
        Ok(Order {
            id,
            order_number: number,
            order_date: Some(now),
            status: OrderStatus::Confirmed,
            total: new_order.total,
            items: new_order.items,
            shipping_address: new_order.shipping_address,
            tracking,
        })
    }

    async fn fetch_order_record(&self, id: OrderId) -> Result<Record> {
        self.gateway
            .get_record_by_id(TABLE, id.into(), &owned_fields(order::FIELDS))
            .await
            .or_fail("Failed to load order")?
            .ok_or(ServiceError::NotFound("Order"))
    }

    /// Look up one order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no such order exists, or an error
    /// if the gateway call fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_order_by_id(&self, id: OrderId) -> Result<Order> {
        let record = self.fetch_order_record(id).await?;
        convert_order(&record).ok_or(ServiceError::NotFound("Order"))
    }

    /// Orders matching `criteria`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway call fails.
    #[instrument(skip(self))]
    pub async fn get_user_orders(&self, criteria: &OrderCriteria) -> Result<Vec<Order>> {
        let records = self
            .gateway
            .fetch_records(TABLE, &criteria.fetch_query())
            .await
            .or_fail("Failed to load orders")?;
        Ok(convert_all(TABLE, &records, convert_order))
    }

    /// The tracking record of order `id`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no such order exists, or an error
    /// if the gateway call fails.
    pub async fn get_order_tracking(&self, id: OrderId) -> Result<Tracking> {
        Ok(self.get_order_by_id(id).await?.tracking)
    }

    /// Move order `id` to `status`, appending a warehouse tracking event.
    ///
    /// The write only applies if the stored tracking record is unchanged
    /// since it was read; otherwise the read-modify-write is retried so that
    /// concurrent updates never drop each other's events.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no such order exists,
    /// `ServiceError::Conflict` if every attempt lost a race, or
    /// `ServiceError::Gateway` if the stored tracking cannot be read or a
    /// gateway call fails.
    #[instrument(skip(self), fields(id = %id, status = %status))]
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        for attempt in 1..=MAX_CONDITIONAL_ATTEMPTS {
            let record = self.fetch_order_record(id).await?;
            let mut tracking = stored_tracking(&record).map_err(|e| {
                error!(error = %e, "Stored tracking is unreadable, refusing to overwrite it");
                ServiceError::gateway_message(UPDATE_FAILED)
            })?;
            tracking.push_event(TrackingEvent::new(
                Utc::now(),
                status.label(),
                WAREHOUSE_LOCATION,
            ));

            let update = status_record(id, status, &tracking).map_err(|e| encode_error(&e))?;
            let expected = Record::new().with(TRACKING, raw_tracking(&record));

            let applied = self
                .gateway
                .update_if(TABLE, update, expected)
                .await
                .or_fail(UPDATE_FAILED)?;

            if applied {
                debug!(events = tracking.events.len(), "Order status updated");
                return self.get_order_by_id(id).await;
            }
            warn!(attempt, "Order tracking changed concurrently, retrying");
        }

        Err(ServiceError::Conflict(format!(
            "order {id} kept changing while updating its status"
        )))
    }

    /// Run `payment` through the payment simulator. No gateway calls.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::PaymentDeclined` if the payment is declined.
    pub async fn process_payment(&self, payment: &PaymentRequest) -> Result<PaymentReceipt> {
        self.payments.process(payment).await
    }
}
