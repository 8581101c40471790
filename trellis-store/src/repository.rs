//! Store trait definition (port) and read-side row types.
//!
//! The write operations are the persistence gateway the activities call;
//! each is a single logical transaction. The read accessors serve the
//! audit view and the integration tests.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use trellis_domain::{ChargeOutcome, EventKind, OrderState, PaymentStatus, ShipmentStatus};

/// A row of the `orders` table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub order_id: String,
    pub state: OrderState,
    pub address_json: Option<Value>,
}

/// A row of the append-only `events` audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub order_id: String,
    pub kind: EventKind,
    pub payload_json: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// A row of the `payments` idempotency ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRow {
    pub payment_id: String,
    pub order_id: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
}

/// A row of the append-only `shipments` progress view.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRow {
    pub order_id: String,
    pub status: ShipmentStatus,
    pub payload_json: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Typed SQL operations on orders, events, payments, and shipments.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order or advance its state. A provided address is
    /// written; an absent one leaves any stored address untouched.
    async fn upsert_order_state(
        &self,
        order_id: &str,
        state: OrderState,
        address: Option<&Value>,
    ) -> Result<(), StoreError>;

    /// Unconditional append to the audit log.
    async fn insert_event(
        &self,
        order_id: &str,
        kind: EventKind,
        payload: Option<&Value>,
    ) -> Result<(), StoreError>;

    /// Replace only `address_json`; never touches `state`. Safe to run
    /// concurrently with state-updating operations.
    async fn update_address(&self, order_id: &str, address: &Value) -> Result<(), StoreError>;

    /// Charge a payment at most once per `payment_id`.
    ///
    /// Locks the payments row inside the transaction; a repeat charge
    /// observes `charged` and returns the stored amount unchanged.
    async fn charge_payment_idempotent(
        &self,
        payment_id: &str,
        order_id: &str,
        amount: Decimal,
    ) -> Result<ChargeOutcome, StoreError>;

    /// Append a shipment progress row.
    async fn insert_shipment(
        &self,
        order_id: &str,
        status: ShipmentStatus,
    ) -> Result<(), StoreError>;

    async fn load_order(&self, order_id: &str) -> Result<Option<OrderRow>, StoreError>;

    /// All audit events for an order, in append order.
    async fn events_for(&self, order_id: &str) -> Result<Vec<EventRow>, StoreError>;

    async fn payment(&self, payment_id: &str) -> Result<Option<PaymentRow>, StoreError>;

    /// All shipment rows for an order, in append order.
    async fn shipments_for(&self, order_id: &str) -> Result<Vec<ShipmentRow>, StoreError>;
}
