//! In-memory store implementation.
//!
//! Used by tests and engine-less development. A single async mutex
//! serializes all operations; for payments that mutex is the in-memory
//! analogue of the Postgres row lock.

use crate::error::StoreError;
use crate::repository::{EventRow, OrderRow, OrderStore, PaymentRow, ShipmentRow};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use trellis_domain::{ChargeOutcome, EventKind, OrderState, PaymentStatus, ShipmentStatus};

#[derive(Default)]
struct Inner {
    orders: HashMap<String, OrderRow>,
    events: Vec<EventRow>,
    payments: HashMap<String, PaymentRow>,
    shipments: Vec<ShipmentRow>,
}

/// HashMap-backed store with the same observable contract as Postgres.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn upsert_order_state(
        &self,
        order_id: &str,
        state: OrderState,
        address: Option<&Value>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.orders.get_mut(order_id) {
            Some(row) => {
                row.state = state;
                if let Some(address) = address {
                    row.address_json = Some(address.clone());
                }
            }
            None => {
                inner.orders.insert(
                    order_id.to_string(),
                    OrderRow {
                        order_id: order_id.to_string(),
                        state,
                        address_json: address.cloned(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn insert_event(
        &self,
        order_id: &str,
        kind: EventKind,
        payload: Option<&Value>,
    ) -> Result<(), StoreError> {
        self.inner.lock().await.events.push(EventRow {
            order_id: order_id.to_string(),
            kind,
            payload_json: payload.cloned(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn update_address(&self, order_id: &str, address: &Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(row) = inner.orders.get_mut(order_id) {
            row.address_json = Some(address.clone());
        }
        Ok(())
    }

    async fn charge_payment_idempotent(
        &self,
        payment_id: &str,
        order_id: &str,
        amount: Decimal,
    ) -> Result<ChargeOutcome, StoreError> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.payments.get(payment_id) {
            return Ok(ChargeOutcome {
                status: PaymentStatus::Charged,
                amount: existing.amount,
                was_new: false,
            });
        }

        inner.payments.insert(
            payment_id.to_string(),
            PaymentRow {
                payment_id: payment_id.to_string(),
                order_id: order_id.to_string(),
                status: PaymentStatus::Charged,
                amount,
            },
        );

        Ok(ChargeOutcome {
            status: PaymentStatus::Charged,
            amount,
            was_new: true,
        })
    }

    async fn insert_shipment(
        &self,
        order_id: &str,
        status: ShipmentStatus,
    ) -> Result<(), StoreError> {
        self.inner.lock().await.shipments.push(ShipmentRow {
            order_id: order_id.to_string(),
            status,
            payload_json: None,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn load_order(&self, order_id: &str) -> Result<Option<OrderRow>, StoreError> {
        Ok(self.inner.lock().await.orders.get(order_id).cloned())
    }

    async fn events_for(&self, order_id: &str) -> Result<Vec<EventRow>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .events
            .iter()
            .filter(|event| event.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn payment(&self, payment_id: &str) -> Result<Option<PaymentRow>, StoreError> {
        Ok(self.inner.lock().await.payments.get(payment_id).cloned())
    }

    async fn shipments_for(&self, order_id: &str) -> Result<Vec<ShipmentRow>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .shipments
            .iter()
            .filter(|shipment| shipment.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_advances_state_and_keeps_address() {
        let store = MemoryStore::new();
        let address = json!({"line1": "123 Main", "city": "Chicago"});

        store
            .upsert_order_state("o-1", OrderState::Received, Some(&address))
            .await
            .unwrap();
        // No address on the next transition; the stored one must survive
        store
            .upsert_order_state("o-1", OrderState::Validated, None)
            .await
            .unwrap();

        let row = store.load_order("o-1").await.unwrap().unwrap();
        assert_eq!(row.state, OrderState::Validated);
        assert_eq!(row.address_json, Some(address));
    }

    #[tokio::test]
    async fn test_update_address_leaves_state_alone() {
        let store = MemoryStore::new();
        store
            .upsert_order_state("o-1", OrderState::Validated, None)
            .await
            .unwrap();

        let new_address = json!({"line1": "456 Oak"});
        store.update_address("o-1", &new_address).await.unwrap();

        let row = store.load_order("o-1").await.unwrap().unwrap();
        assert_eq!(row.state, OrderState::Validated);
        assert_eq!(row.address_json, Some(new_address));
    }

    #[tokio::test]
    async fn test_charge_is_idempotent_per_payment_id() {
        let store = MemoryStore::new();

        let first = store
            .charge_payment_idempotent("pay-1", "o-1", dec!(2))
            .await
            .unwrap();
        assert!(first.was_new);
        assert_eq!(first.amount, dec!(2));

        // A retry with a different computed amount still observes the
        // original charge.
        let second = store
            .charge_payment_idempotent("pay-1", "o-1", dec!(99))
            .await
            .unwrap();
        assert!(!second.was_new);
        assert_eq!(second.amount, dec!(2));

        let row = store.payment("pay-1").await.unwrap().unwrap();
        assert_eq!(row.amount, dec!(2));
        assert_eq!(row.status, PaymentStatus::Charged);
    }

    #[tokio::test]
    async fn test_events_preserve_append_order() {
        let store = MemoryStore::new();
        store
            .insert_event("o-1", EventKind::OrderReceived, None)
            .await
            .unwrap();
        store
            .insert_event("o-1", EventKind::OrderValidated, None)
            .await
            .unwrap();
        store
            .insert_event("o-2", EventKind::OrderReceived, None)
            .await
            .unwrap();

        let events = store.events_for("o-1").await.unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|event| event.kind).collect();
        assert_eq!(kinds, vec![EventKind::OrderReceived, EventKind::OrderValidated]);
    }

    #[tokio::test]
    async fn test_shipments_accumulate_per_stage() {
        let store = MemoryStore::new();
        store
            .insert_shipment("o-1", ShipmentStatus::Prepared)
            .await
            .unwrap();
        store
            .insert_shipment("o-1", ShipmentStatus::Dispatched)
            .await
            .unwrap();

        let rows = store.shipments_for("o-1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, ShipmentStatus::Prepared);
        assert_eq!(rows[1].status, ShipmentStatus::Dispatched);
    }
}
