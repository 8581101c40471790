//! Order workflow: the main state machine.

use crate::options::{
    activity_options, MANUAL_REVIEW_WINDOW, MAX_CHILD_ATTEMPTS, ORDER_RUN_TIMEOUT,
    REVIEW_POLL_INTERVAL, SHIPPING_TASK_QUEUE, SIGNAL_APPROVE, SIGNAL_CANCEL,
    SIGNAL_DISPATCH_FAILED, SIGNAL_UPDATE_ADDRESS,
};
use crate::shipping::ShippingWorkflow;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use trellis_activities::names;
use trellis_domain::{
    ChargePaymentInput, MarkShippedInput, OrderItem, OrderRecord, OrderSnapshot,
    PersistAddressInput, ReceiveOrderInput, ShippingInput, StartOrderInput,
};
use trellis_engine::{
    EngineError, QueryFn, Runtime, SignalRouter, StartOptions, WorkflowCtx, WorkflowHandle,
};

/// Workflow id under which an order is started.
pub fn order_workflow_id(order_id: &str) -> String {
    format!("order-{order_id}")
}

/// In-memory workflow state, reconstructed by the engine on replay.
///
/// Ids start empty so signal handlers can merge into it before the run
/// hydrates it from the start payload.
#[derive(Default)]
struct WorkflowState {
    order_id: String,
    payment_id: String,
    address: Option<Value>,
    items: Option<Vec<OrderItem>>,

    approved: bool,
    canceled: bool,
    cancel_reason: Option<String>,

    current_step: String,
    child_attempts: u32,
    last_error: Option<String>,
    dispatch_failed_reason: Option<String>,
}

impl WorkflowState {
    fn new() -> Self {
        Self {
            current_step: "init".to_string(),
            ..Self::default()
        }
    }

    fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            order_id: self.order_id.clone(),
            step: self.current_step.clone(),
            approved: self.approved,
            canceled: self.canceled,
            cancel_reason: self.cancel_reason.clone(),
            child_attempts: self.child_attempts,
            last_error: self.last_error.clone(),
            dispatch_failed_reason: self.dispatch_failed_reason.clone(),
        }
    }
}

fn lock(state: &Arc<Mutex<WorkflowState>>) -> MutexGuard<'_, WorkflowState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, EngineError> {
    serde_json::from_value(value).map_err(|e| EngineError::Payload(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, EngineError> {
    serde_json::to_value(value).map_err(|e| EngineError::Payload(e.to_string()))
}

/// The order orchestrator.
///
/// Sequencing: receive, validate, optional address persist, manual-review
/// gate, charge, shipping child with bounded retry, mark shipped.
/// Cancellation is honored at the checkpoints between activities and once
/// per tick of the review loop; in-flight activities are never interrupted.
pub struct OrderWorkflow {
    state: Arc<Mutex<WorkflowState>>,
    shipping_queue: String,
}

impl OrderWorkflow {
    pub fn new() -> Self {
        Self::with_shipping_queue(SHIPPING_TASK_QUEUE)
    }

    pub fn with_shipping_queue(queue: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(WorkflowState::new())),
            shipping_queue: queue.into(),
        }
    }

    /// Wire the signal handlers against the shared state. Built before
    /// the run is spawned, so early signals land safely.
    pub fn signal_router(&self) -> SignalRouter {
        let approve = self.state.clone();
        let cancel = self.state.clone();
        let address = self.state.clone();
        let dispatch = self.state.clone();

        SignalRouter::builder()
            .on(SIGNAL_APPROVE, move |_payload| {
                lock(&approve).approved = true;
            })
            .on(SIGNAL_CANCEL, move |payload| {
                let reason = payload
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("user_request")
                    .to_string();
                let mut state = lock(&cancel);
                state.canceled = true;
                state.cancel_reason = Some(reason);
            })
            .on(SIGNAL_UPDATE_ADDRESS, move |payload| {
                lock(&address).address = Some(payload);
            })
            .on(SIGNAL_DISPATCH_FAILED, move |payload| {
                let reason = payload
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| payload.to_string());
                lock(&dispatch).dispatch_failed_reason = Some(reason);
            })
            .build()
    }

    /// Query function serving the `status` snapshot.
    pub fn query_fn(&self) -> QueryFn {
        let state = self.state.clone();
        Arc::new(move || {
            serde_json::to_value(lock(&state).snapshot()).unwrap_or(Value::Null)
        })
    }

    fn set_step(&self, step: &str) {
        debug!(step, "workflow step");
        lock(&self.state).current_step = step.to_string();
    }

    fn canceled(&self) -> bool {
        lock(&self.state).canceled
    }

    pub async fn run(self, ctx: WorkflowCtx, input: StartOrderInput) -> Result<String, EngineError> {
        let options = activity_options();

        // Hydrate state from the start payload. Flags set by signals that
        // arrived before the run are preserved; an early address signal
        // wins over the one supplied at start.
        {
            let mut state = lock(&self.state);
            state.order_id = input.order_id.clone();
            state.payment_id = input.payment_id.clone();
            state.items = input.items.clone();
            if state.address.is_none() {
                state.address = input.address;
            }
        }

        // --- receive ---
        self.set_step("receive_order");
        let receive_payload = {
            let state = lock(&self.state);
            encode(&ReceiveOrderInput {
                order_id: state.order_id.clone(),
                address: state.address.clone(),
                items: state.items.clone(),
            })?
        };
        let received = ctx
            .execute_activity(names::RECEIVE_ORDER, receive_payload, &options)
            .await?;
        if self.canceled() {
            return Ok("canceled".to_string());
        }

        // --- validate ---
        self.set_step("validate_order");
        let order: OrderRecord = decode(received)?;
        ctx.execute_activity(names::VALIDATE_ORDER, encode(&order)?, &options)
            .await?;
        if self.canceled() {
            return Ok("canceled".to_string());
        }

        // --- persist latest address, if any ---
        // Covers both the address supplied at start and one signaled
        // while validation ran.
        let dirty_address = lock(&self.state).address.clone();
        if let Some(address) = dirty_address {
            self.set_step("persist_address");
            let payload = encode(&PersistAddressInput {
                order_id: order.order_id.clone(),
                address,
            })?;
            ctx.execute_activity(names::PERSIST_ADDRESS, payload, &options)
                .await?;
            if self.canceled() {
                return Ok("canceled".to_string());
            }
        }

        // --- manual review gate ---
        self.set_step("awaiting_approval");
        let deadline = ctx.now() + MANUAL_REVIEW_WINDOW;
        loop {
            let (approved, canceled) = {
                let state = lock(&self.state);
                (state.approved, state.canceled)
            };
            if approved || canceled || ctx.now() >= deadline {
                break;
            }
            ctx.sleep(REVIEW_POLL_INTERVAL).await;
        }

        let (approved, canceled) = {
            let state = lock(&self.state);
            (state.approved, state.canceled)
        };
        if canceled {
            return Ok("canceled".to_string());
        }
        if !approved {
            lock(&self.state).last_error = Some("manual_review_timeout".to_string());
            info!(order_id = %order.order_id, "manual review timed out");
            return Ok("failed".to_string());
        }

        // --- charge payment (idempotent downstream) ---
        self.set_step("charge_payment");
        let charge_payload = {
            let state = lock(&self.state);
            encode(&ChargePaymentInput {
                order: order.clone(),
                payment_id: state.payment_id.clone(),
            })?
        };
        ctx.execute_activity(names::CHARGE_PAYMENT, charge_payload, &options)
            .await?;

        // --- shipping child, retried up to the attempt bound ---
        self.set_step("shipping_child");
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            lock(&self.state).child_attempts = attempts;

            let child_input = ShippingInput {
                order: OrderRecord {
                    order_id: order.order_id.clone(),
                    items: order.items.clone(),
                    address: lock(&self.state).address.clone(),
                },
                parent_workflow_id: ctx.workflow_id().to_string(),
            };
            let child_id = format!("ship-{}-{}", order.order_id, attempts);

            match ShippingWorkflow::execute(&ctx, child_input, child_id, &self.shipping_queue).await
            {
                Ok(_) => break,
                Err(failure) => {
                    info!(
                        order_id = %order.order_id,
                        attempt = attempts,
                        error = %failure,
                        "shipping child failed"
                    );
                    lock(&self.state).last_error = Some(format!("shipping_failed: {failure}"));
                    if attempts >= MAX_CHILD_ATTEMPTS {
                        return Ok("failed".to_string());
                    }
                }
            }
        }

        // --- mark shipped ---
        self.set_step("mark_shipped");
        let payload = encode(&MarkShippedInput {
            order_id: order.order_id.clone(),
        })?;
        ctx.execute_activity(names::MARK_SHIPPED, payload, &options)
            .await?;

        self.set_step("done");
        info!(order_id = %order.order_id, "order shipped");
        Ok("shipped".to_string())
    }
}

impl Default for OrderWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

/// Start an order workflow on the orders queue under `order-<order_id>`.
pub async fn start_order(
    runtime: &Arc<Runtime>,
    input: StartOrderInput,
    orders_queue: &str,
    shipping_queue: &str,
) -> Result<WorkflowHandle, EngineError> {
    let workflow = OrderWorkflow::with_shipping_queue(shipping_queue);
    let signals = Arc::new(workflow.signal_router());
    let query = workflow.query_fn();
    let workflow_id = order_workflow_id(&input.order_id);

    runtime
        .start_workflow(
            StartOptions {
                workflow_id,
                task_queue: orders_queue.to_string(),
                run_timeout: ORDER_RUN_TIMEOUT,
            },
            signals,
            query,
            move |ctx| workflow.run(ctx, input),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signals_merge_into_state_before_run() {
        let workflow = OrderWorkflow::new();
        let router = workflow.signal_router();

        assert!(router.deliver(SIGNAL_APPROVE, Value::Null));
        assert!(router.deliver(SIGNAL_CANCEL, json!({"reason": "fraud"})));
        assert!(router.deliver(SIGNAL_UPDATE_ADDRESS, json!({"line1": "456 Oak"})));
        assert!(router.deliver(SIGNAL_DISPATCH_FAILED, json!("carrier down")));
        assert!(!router.deliver("unknown", Value::Null));

        let snapshot: OrderSnapshot =
            serde_json::from_value((workflow.query_fn())()).unwrap();
        assert_eq!(snapshot.order_id, "");
        assert_eq!(snapshot.step, "init");
        assert!(snapshot.approved);
        assert!(snapshot.canceled);
        assert_eq!(snapshot.cancel_reason.as_deref(), Some("fraud"));
        assert_eq!(snapshot.dispatch_failed_reason.as_deref(), Some("carrier down"));
    }

    #[test]
    fn test_cancel_reason_defaults_to_user_request() {
        let workflow = OrderWorkflow::new();
        let router = workflow.signal_router();

        assert!(router.deliver(SIGNAL_CANCEL, json!({})));

        let snapshot: OrderSnapshot =
            serde_json::from_value((workflow.query_fn())()).unwrap();
        assert_eq!(snapshot.cancel_reason.as_deref(), Some("user_request"));
    }

    #[test]
    fn test_workflow_id_scheme() {
        assert_eq!(order_workflow_id("o-1"), "order-o-1");
    }
}
