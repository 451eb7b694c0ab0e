//! Orders, tracking and payments.
//!
//! Line items, the shipping address and the tracking record are stored as
//! JSON text on the order row, so these types also define that JSON shape
//! (camelCase keys).

use atelier_core::{
    OrderId, OrderStatus, PaymentStatus, Price, ProductId, saturating_total, saturating_units,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CartItem;

/// Carrier assigned to every new shipment.
pub const DEFAULT_CARRIER: &str = "FedEx";

/// One purchased line, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub selected_size: String,
    #[serde(default)]
    pub selected_color: String,
}

impl OrderLine {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            price: item.price,
            quantity: item.quantity,
            selected_size: item.selected_size.clone(),
            selected_color: item.selected_color.clone(),
        }
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// One step in a shipment's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub date: DateTime<Utc>,
    pub status: String,
    pub location: String,
}

impl TrackingEvent {
    #[must_use]
    pub fn new(date: DateTime<Utc>, status: &str, location: &str) -> Self {
        Self {
            date,
            status: status.to_string(),
            location: location.to_string(),
        }
    }
}

/// Shipment tracking record.
///
/// `events` only ever grows: existing events are never reordered or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tracking {
    pub carrier: String,
    pub tracking_number: String,
    pub events: Vec<TrackingEvent>,
}

impl Tracking {
    /// Append an event to the history.
    pub fn push_event(&mut self, event: TrackingEvent) {
        self.events.push(event);
    }

    /// The most recent event.
    #[must_use]
    pub fn latest(&self) -> Option<&TrackingEvent> {
        self.events.last()
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// `VT` followed by six digits.
    pub order_number: String,
    /// `None` when the stored date could not be parsed.
    pub order_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub total: Price,
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub tracking: Tracking,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        saturating_units(self.items.iter().map(|line| line.quantity))
    }
}

/// Checkout input for a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub total: Price,
}

impl NewOrder {
    /// Build an order from cart lines, totalling them.
    #[must_use]
    pub fn from_cart(items: &[CartItem], shipping_address: ShippingAddress) -> Self {
        let items: Vec<OrderLine> = items.iter().map(OrderLine::from).collect();
        let total = Price::new(saturating_total(items.iter().map(OrderLine::line_total)));
        Self {
            items,
            shipping_address,
            total,
        }
    }
}

/// Input to the payment simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Price,
    #[serde(default)]
    pub order_number: Option<String>,
}

/// Proof of an approved payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// `txn_` followed by the epoch-millisecond clock.
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub amount: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::CartItemId;
    use serde_json::json;

    fn cart_line(id: i64, cents: i64, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(id * 10),
            product_name: format!("Item {id}"),
            price: Price::from_cents(cents),
            quantity,
            selected_size: "M".to_string(),
            selected_color: "Navy".to_string(),
        }
    }

    #[test]
    fn test_new_order_from_cart_totals_lines() {
        let cart = vec![cart_line(1, 2500, 2), cart_line(2, 1000, 1)];
        let order = NewOrder::from_cart(&cart, ShippingAddress::default());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total, Price::from_cents(6000));
    }

    #[test]
    fn test_huge_cart_does_not_overflow() {
        let cart = vec![cart_line(1, 100, 4_000_000_000), cart_line(2, 100, 400_000_000)];
        let order = NewOrder::from_cart(&cart, ShippingAddress::default());
        assert_eq!(order.total, Price::from_cents(440_000_000_000));

        let placed = Order {
            id: OrderId::new(1),
            order_number: "VT000001".to_string(),
            order_date: None,
            status: OrderStatus::Confirmed,
            total: order.total,
            items: order.items,
            shipping_address: order.shipping_address,
            tracking: Tracking::default(),
        };
        assert_eq!(placed.unit_count(), u32::MAX);
    }

    #[test]
    fn test_tracking_json_shape() {
        let date = DateTime::parse_from_rfc3339("2026-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let tracking = Tracking {
            carrier: DEFAULT_CARRIER.to_string(),
            tracking_number: "TRK12345678".to_string(),
            events: vec![TrackingEvent::new(date, "Order placed", "Online")],
        };
        let value = serde_json::to_value(&tracking).unwrap();
        assert_eq!(value["trackingNumber"], json!("TRK12345678"));
        assert_eq!(value["events"][0]["status"], json!("Order placed"));
        assert_eq!(value["events"][0]["location"], json!("Online"));
    }

    #[test]
    fn test_shipping_address_tolerates_missing_fields() {
        let address: ShippingAddress =
            serde_json::from_value(json!({"fullName": "Ada Park", "city": "Lisbon"})).unwrap();
        assert_eq!(address.full_name, "Ada Park");
        assert_eq!(address.city, "Lisbon");
        assert!(address.address_line2.is_none());
        assert!(address.postal_code.is_empty());
    }

    #[test]
    fn test_order_line_accepts_numeric_price() {
        let line: OrderLine = serde_json::from_value(json!({
            "productId": 4,
            "productName": "Canvas Tote",
            "price": 18.5,
            "quantity": 2
        }))
        .unwrap();
        assert_eq!(line.line_total(), Decimal::new(37, 0));
    }
}
