//! Order lifecycle states and order contents.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Business state of an order.
///
/// States only move forward through this sequence; retried activities
/// re-assert the state they already reached but never regress it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Received,
    Validated,
    PaymentCharged,
    Shipping,
    Shipped,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Received => "received",
            OrderState::Validated => "validated",
            OrderState::PaymentCharged => "payment_charged",
            OrderState::Shipping => "shipping",
            OrderState::Shipped => "shipped",
        }
    }

    /// Position in the forward-only lifecycle, for monotonicity checks.
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(OrderState::Received),
            "validated" => Ok(OrderState::Validated),
            "payment_charged" => Ok(OrderState::PaymentCharged),
            "shipping" => Ok(OrderState::Shipping),
            "shipped" => Ok(OrderState::Shipped),
            other => Err(DomainError::InvalidState(other.to_string())),
        }
    }
}

/// Stage of a shipment row (append-only progress record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Prepared,
    Dispatched,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Prepared => "prepared",
            ShipmentStatus::Dispatched => "dispatched",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prepared" => Ok(ShipmentStatus::Prepared),
            "dispatched" => Ok(ShipmentStatus::Dispatched),
            other => Err(DomainError::InvalidState(other.to_string())),
        }
    }
}

/// One line of an order. A missing quantity on the wire defaults to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku: String,
    #[serde(default = "default_qty")]
    pub qty: i64,
}

fn default_qty() -> i64 {
    1
}

impl OrderItem {
    /// Substitute item used when an order is received with no items at all.
    pub fn default_item() -> Self {
        Self {
            sku: "ABC".to_string(),
            qty: 1,
        }
    }
}

/// The order object handed from `receive_order` through the rest of the
/// pipeline and into the shipping child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub address: Option<serde_json::Value>,
}

impl OrderRecord {
    /// Total quantity across all items; the payment amount is this sum.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.qty).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_order_is_forward() {
        let sequence = [
            OrderState::Received,
            OrderState::Validated,
            OrderState::PaymentCharged,
            OrderState::Shipping,
            OrderState::Shipped,
        ];

        for pair in sequence.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_state_round_trip() {
        for state in [
            OrderState::Received,
            OrderState::Validated,
            OrderState::PaymentCharged,
            OrderState::Shipping,
            OrderState::Shipped,
        ] {
            assert_eq!(state.as_str().parse::<OrderState>().unwrap(), state);
        }

        assert!("refunded".parse::<OrderState>().is_err());
    }

    #[test]
    fn test_item_qty_defaults_to_one() {
        let item: OrderItem = serde_json::from_value(json!({"sku": "XYZ"})).unwrap();
        assert_eq!(item.qty, 1);
    }

    #[test]
    fn test_total_quantity_sums_items() {
        let order: OrderRecord = serde_json::from_value(json!({
            "order_id": "o-1",
            "items": [{"sku": "A", "qty": 2}, {"sku": "B"}],
        }))
        .unwrap();

        assert_eq!(order.total_quantity(), 3);
        assert!(order.address.is_none());
    }
}
