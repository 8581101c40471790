//! Wire payloads exchanged between the admission layer, the workflows,
//! and the activities. Every activity takes a single JSON payload and
//! returns a single JSON result; these are the typed shapes behind them.

use crate::order::{OrderItem, OrderRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Start payload for an order workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOrderInput {
    pub order_id: String,
    pub payment_id: String,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
}

/// Payload of the `receive_order` activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveOrderInput {
    pub order_id: String,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
}

/// Payload of the `charge_payment` activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargePaymentInput {
    pub order: OrderRecord,
    pub payment_id: String,
}

/// Payload of the `persist_address` activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistAddressInput {
    pub order_id: String,
    pub address: Value,
}

/// Payload of the `mark_shipped` activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkShippedInput {
    pub order_id: String,
}

/// Start payload for a shipping child workflow. `parent_workflow_id`
/// is where the `dispatch_failed` back-signal is delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInput {
    pub order: OrderRecord,
    pub parent_workflow_id: String,
}
