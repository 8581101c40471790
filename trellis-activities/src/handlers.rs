//! The seven activity bodies.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use trellis_domain::{
    ChargePaymentInput, EventKind, MarkShippedInput, OrderItem, OrderRecord, OrderState,
    PersistAddressInput, ReceiveOrderInput, ShipmentStatus,
};
use trellis_engine::ActivityError;
use trellis_store::{OrderStore, StoreError};

use crate::fault::FaultInjector;

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, ActivityError> {
    serde_json::from_value(payload)
        .map_err(|e| ActivityError::non_retryable(format!("payload decode: {e}")))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ActivityError> {
    serde_json::to_value(value)
        .map_err(|e| ActivityError::non_retryable(format!("result encode: {e}")))
}

fn store_err(err: StoreError) -> ActivityError {
    if err.is_retryable() {
        ActivityError::transient(err.to_string())
    } else {
        ActivityError::non_retryable(err.to_string())
    }
}

/// Create/record the order row. Substitutes a default item when none
/// were supplied. Returns the order object the rest of the pipeline uses.
pub async fn receive_order(
    store: &dyn OrderStore,
    faults: &dyn FaultInjector,
    payload: Value,
) -> Result<Value, ActivityError> {
    faults.inject(crate::names::RECEIVE_ORDER).await?;
    let input: ReceiveOrderInput = decode(payload)?;

    let items = input
        .items
        .unwrap_or_else(|| vec![OrderItem::default_item()]);

    store
        .upsert_order_state(&input.order_id, OrderState::Received, input.address.as_ref())
        .await
        .map_err(store_err)?;

    let event = json!({"address": input.address, "items": items});
    store
        .insert_event(&input.order_id, EventKind::OrderReceived, Some(&event))
        .await
        .map_err(store_err)?;

    info!(order_id = %input.order_id, "order received");

    encode(&OrderRecord {
        order_id: input.order_id,
        items,
        address: input.address,
    })
}

/// Validate order contents. An order without items is invalid and the
/// failure is not worth retrying.
pub async fn validate_order(
    store: &dyn OrderStore,
    faults: &dyn FaultInjector,
    payload: Value,
) -> Result<Value, ActivityError> {
    faults.inject(crate::names::VALIDATE_ORDER).await?;
    let order: OrderRecord = decode(payload)?;

    if order.items.is_empty() {
        return Err(ActivityError::non_retryable(
            "invalid_order: no items to validate",
        ));
    }

    store
        .upsert_order_state(&order.order_id, OrderState::Validated, None)
        .await
        .map_err(store_err)?;

    let event = json!({"items": order.items});
    store
        .insert_event(&order.order_id, EventKind::OrderValidated, Some(&event))
        .await
        .map_err(store_err)?;

    info!(order_id = %order.order_id, "order validated");
    Ok(Value::Bool(true))
}

/// Charge the payment under the idempotency key. The amount is the sum
/// of item quantities; on a repeat charge the stored amount wins and a
/// `payment_idempotent` event is appended instead.
pub async fn charge_payment(
    store: &dyn OrderStore,
    faults: &dyn FaultInjector,
    payload: Value,
) -> Result<Value, ActivityError> {
    faults.inject(crate::names::CHARGE_PAYMENT).await?;
    let input: ChargePaymentInput = decode(payload)?;

    let order_id = input.order.order_id.clone();
    let amount = Decimal::from(input.order.total_quantity());

    let outcome = store
        .charge_payment_idempotent(&input.payment_id, &order_id, amount)
        .await
        .map_err(store_err)?;

    store
        .upsert_order_state(&order_id, OrderState::PaymentCharged, None)
        .await
        .map_err(store_err)?;

    let kind = if outcome.was_new {
        EventKind::PaymentCharged
    } else {
        EventKind::PaymentIdempotent
    };
    let event = json!({"payment_id": input.payment_id, "amount": outcome.amount});
    store
        .insert_event(&order_id, kind, Some(&event))
        .await
        .map_err(store_err)?;

    info!(
        order_id = %order_id,
        payment_id = %input.payment_id,
        amount = %outcome.amount,
        was_new = outcome.was_new,
        "payment charged"
    );

    Ok(json!({"status": "charged", "amount": outcome.amount}))
}

/// Record the package as prepared.
pub async fn prepare_package(
    store: &dyn OrderStore,
    faults: &dyn FaultInjector,
    payload: Value,
) -> Result<Value, ActivityError> {
    faults.inject(crate::names::PREPARE_PACKAGE).await?;
    let order: OrderRecord = decode(payload)?;

    store
        .insert_shipment(&order.order_id, ShipmentStatus::Prepared)
        .await
        .map_err(store_err)?;
    store
        .insert_event(&order.order_id, EventKind::PackagePrepared, None)
        .await
        .map_err(store_err)?;

    info!(order_id = %order.order_id, "package prepared");
    Ok(json!("Package ready"))
}

/// Hand the package to the carrier and mark the order as in shipping.
/// The final `shipped` state is written by `mark_shipped`.
pub async fn dispatch_carrier(
    store: &dyn OrderStore,
    faults: &dyn FaultInjector,
    payload: Value,
) -> Result<Value, ActivityError> {
    faults.inject(crate::names::DISPATCH_CARRIER).await?;
    let order: OrderRecord = decode(payload)?;

    store
        .insert_shipment(&order.order_id, ShipmentStatus::Dispatched)
        .await
        .map_err(store_err)?;
    store
        .upsert_order_state(&order.order_id, OrderState::Shipping, None)
        .await
        .map_err(store_err)?;
    store
        .insert_event(&order.order_id, EventKind::CarrierDispatched, None)
        .await
        .map_err(store_err)?;

    info!(order_id = %order.order_id, "carrier dispatched");
    Ok(json!("Dispatched"))
}

/// Final state transition once the shipping child has completed.
pub async fn mark_shipped(
    store: &dyn OrderStore,
    faults: &dyn FaultInjector,
    payload: Value,
) -> Result<Value, ActivityError> {
    faults.inject(crate::names::MARK_SHIPPED).await?;
    let input: MarkShippedInput = decode(payload)?;

    store
        .upsert_order_state(&input.order_id, OrderState::Shipped, None)
        .await
        .map_err(store_err)?;
    store
        .insert_event(&input.order_id, EventKind::OrderShipped, None)
        .await
        .map_err(store_err)?;

    info!(order_id = %input.order_id, "order shipped");
    Ok(json!("Shipped"))
}

/// Replace only the stored address; order state is untouched.
pub async fn persist_address(
    store: &dyn OrderStore,
    faults: &dyn FaultInjector,
    payload: Value,
) -> Result<Value, ActivityError> {
    faults.inject(crate::names::PERSIST_ADDRESS).await?;
    let input: PersistAddressInput = decode(payload)?;

    store
        .update_address(&input.order_id, &input.address)
        .await
        .map_err(store_err)?;
    store
        .insert_event(&input.order_id, EventKind::AddressUpdated, Some(&input.address))
        .await
        .map_err(store_err)?;

    info!(order_id = %input.order_id, "address updated");
    Ok(json!("address_updated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::NoFaults;
    use rust_decimal_macros::dec;
    use trellis_domain::PaymentStatus;
    use trellis_store::MemoryStore;

    fn order_payload(order_id: &str, qty: i64) -> Value {
        json!({
            "order_id": order_id,
            "items": [{"sku": "ABC", "qty": qty}],
        })
    }

    #[tokio::test]
    async fn test_receive_order_substitutes_default_item() {
        let store = MemoryStore::new();

        let result = receive_order(&store, &NoFaults, json!({"order_id": "o-1"}))
            .await
            .unwrap();
        let order: OrderRecord = serde_json::from_value(result).unwrap();

        assert_eq!(order.items, vec![OrderItem::default_item()]);
        let row = store.load_order("o-1").await.unwrap().unwrap();
        assert_eq!(row.state, OrderState::Received);

        let events = store.events_for("o-1").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::OrderReceived);
    }

    #[tokio::test]
    async fn test_validate_order_rejects_empty_items() {
        let store = MemoryStore::new();

        let err = validate_order(&store, &NoFaults, json!({"order_id": "o-1", "items": []}))
            .await
            .unwrap_err();

        assert!(!err.is_retryable());
        assert!(err.reason().contains("invalid_order"));
        // Nothing was persisted for the invalid order
        assert!(store.load_order("o-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_charge_payment_twice_is_idempotent() {
        let store = MemoryStore::new();
        let payload = json!({
            "order": {"order_id": "o-1", "items": [{"qty": 2, "sku": "ABC"}]},
            "payment_id": "pay-o-1",
        });

        let first = charge_payment(&store, &NoFaults, payload.clone())
            .await
            .unwrap();
        let second = charge_payment(&store, &NoFaults, payload).await.unwrap();

        assert_eq!(first["status"], "charged");
        assert_eq!(second["status"], "charged");
        assert_eq!(first["amount"], second["amount"]);

        let row = store.payment("pay-o-1").await.unwrap().unwrap();
        assert_eq!(row.amount, dec!(2));
        assert_eq!(row.status, PaymentStatus::Charged);

        // First charge appends payment_charged, the replay appends
        // payment_idempotent
        let kinds: Vec<EventKind> = store
            .events_for("o-1")
            .await
            .unwrap()
            .iter()
            .map(|event| event.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::PaymentCharged, EventKind::PaymentIdempotent]
        );
    }

    #[tokio::test]
    async fn test_shipping_activities_append_rows() {
        let store = MemoryStore::new();

        prepare_package(&store, &NoFaults, order_payload("o-1", 1))
            .await
            .unwrap();
        dispatch_carrier(&store, &NoFaults, order_payload("o-1", 1))
            .await
            .unwrap();

        let shipments = store.shipments_for("o-1").await.unwrap();
        assert_eq!(shipments.len(), 2);
        assert_eq!(shipments[0].status, ShipmentStatus::Prepared);
        assert_eq!(shipments[1].status, ShipmentStatus::Dispatched);

        let row = store.load_order("o-1").await.unwrap().unwrap();
        assert_eq!(row.state, OrderState::Shipping);
    }

    #[tokio::test]
    async fn test_persist_address_keeps_state() {
        let store = MemoryStore::new();
        store
            .upsert_order_state("o-1", OrderState::Validated, None)
            .await
            .unwrap();

        let result = persist_address(
            &store,
            &NoFaults,
            json!({"order_id": "o-1", "address": {"line1": "456 Oak"}}),
        )
        .await
        .unwrap();
        assert_eq!(result, json!("address_updated"));

        let row = store.load_order("o-1").await.unwrap().unwrap();
        assert_eq!(row.state, OrderState::Validated);
        assert_eq!(row.address_json, Some(json!({"line1": "456 Oak"})));
    }

    #[tokio::test]
    async fn test_faulted_activity_surfaces_transient_error() {
        let store = MemoryStore::new();
        let faults = crate::fault::ScriptedFaults::new();
        faults.fail(crate::names::RECEIVE_ORDER, 1);

        let err = receive_order(&store, &faults, json!({"order_id": "o-1"}))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        // The fault fires before any side effect
        assert!(store.load_order("o-1").await.unwrap().is_none());
    }
}
