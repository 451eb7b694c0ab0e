//! `order_c` table.
//!
//! Line items, the shipping address and tracking are JSON text columns.

use atelier_core::{OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use super::{decimal_value, json_field, price_field, text_field};
use crate::gateway::{ID_FIELD, Record};
use crate::models::{NewOrder, Order, Tracking};

pub const TABLE: &str = "order_c";

pub const ORDER_NUMBER: &str = "order_number_c";
pub const ORDER_DATE: &str = "order_date_c";
pub const STATUS: &str = "status_c";
pub const TOTAL: &str = "total_c";
pub const ITEMS: &str = "items_c";
pub const SHIPPING_ADDRESS: &str = "shipping_address_c";
pub const TRACKING: &str = "tracking_c";

pub const FIELDS: &[&str] = &[
    ID_FIELD,
    ORDER_NUMBER,
    ORDER_DATE,
    STATUS,
    TOTAL,
    ITEMS,
    SHIPPING_ADDRESS,
    TRACKING,
];

fn parse_status(record: &Record) -> OrderStatus {
    let raw = text_field(record, STATUS);
    if raw.trim().is_empty() {
        return OrderStatus::default();
    }
    raw.parse().unwrap_or_else(|e: String| {
        warn!(id = ?record.id(), error = %e, "Unknown order status, reading as confirmed");
        OrderStatus::default()
    })
}

fn parse_date(record: &Record) -> Option<DateTime<Utc>> {
    let raw = text_field(record, ORDER_DATE);
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|date| date.with_timezone(&Utc))
        .ok()
}

/// Read an order row. `None` when the row has no usable `Id`.
#[must_use]
pub fn convert_order(record: &Record) -> Option<Order> {
    Some(Order {
        id: record.id()?.typed::<OrderId>(),
        order_number: text_field(record, ORDER_NUMBER),
        order_date: parse_date(record),
        status: parse_status(record),
        total: price_field(record, TOTAL),
        items: json_field(record, ITEMS),
        shipping_address: json_field(record, SHIPPING_ADDRESS),
        tracking: json_field(record, TRACKING),
    })
}

/// Strictly parse the tracking column.
///
/// A missing or blank column reads as an empty [`Tracking`]; unlike
/// [`convert_order`], a malformed one is an error rather than a default, so
/// callers never write back a history they could not read.
///
/// # Errors
///
/// Returns an error if the stored blob is not a valid tracking record.
pub fn stored_tracking(record: &Record) -> serde_json::Result<Tracking> {
    match record.get(TRACKING) {
        None | Some(Value::Null) => Ok(Tracking::default()),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(Tracking::default()),
        Some(Value::String(text)) => serde_json::from_str(text),
        Some(value) => serde_json::from_value(value.clone()),
    }
}

/// The tracking column exactly as stored, for compare-and-set updates.
#[must_use]
pub fn raw_tracking(record: &Record) -> Value {
    record.get_or_null(TRACKING)
}

/// Flat record for inserting a new order.
///
/// # Errors
///
/// Returns an error if a JSON column cannot be serialized.
pub fn new_order_record(
    order: &NewOrder,
    order_number: &str,
    placed_at: DateTime<Utc>,
    tracking: &Tracking,
) -> serde_json::Result<Record> {
    Ok(Record::new()
        .with(ORDER_NUMBER, order_number)
        .with(ORDER_DATE, placed_at.to_rfc3339())
        .with(STATUS, OrderStatus::Confirmed.as_str())
        .with(TOTAL, decimal_value(order.total.amount()))
        .with(ITEMS, serde_json::to_string(&order.items)?)
        .with(SHIPPING_ADDRESS, serde_json::to_string(&order.shipping_address)?)
        .with(TRACKING, serde_json::to_string(tracking)?))
}

/// Partial record setting the status and tracking of order `id`.
///
/// # Errors
///
/// Returns an error if the tracking record cannot be serialized.
pub fn status_record(
    id: OrderId,
    status: OrderStatus,
    tracking: &Tracking,
) -> serde_json::Result<Record> {
    Ok(Record::new()
        .with(ID_FIELD, id.as_i64())
        .with(STATUS, status.as_str())
        .with(TRACKING, serde_json::to_string(tracking)?))
}
