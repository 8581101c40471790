//! Test harness for workflow and admission tests.
//!
//! Builds an in-process runtime with both worker hosts bound to their
//! task queues, backed by the in-memory store and a scriptable fault
//! injector.

use std::sync::Arc;
use trellis_activities::{orders_activities, shipping_activities, FaultInjector, ScriptedFaults};
use trellis_domain::StartOrderInput;
use trellis_engine::{EngineError, Runtime, Worker, WorkerOptions, WorkflowHandle};
use trellis_store::{MemoryStore, OrderStore};
use trellis_workflows::{start_order, ORDERS_TASK_QUEUE, SHIPPING_TASK_QUEUE};
use uuid::Uuid;

/// Runtime, store, and fault injector wired like the two worker hosts.
pub struct TestHarness {
    pub runtime: Arc<Runtime>,
    pub store: Arc<MemoryStore>,
    pub faults: Arc<ScriptedFaults>,
}

impl TestHarness {
    /// Start an order workflow on the default queues.
    pub async fn start_order(
        &self,
        input: StartOrderInput,
    ) -> Result<WorkflowHandle, EngineError> {
        start_order(&self.runtime, input, ORDERS_TASK_QUEUE, SHIPPING_TASK_QUEUE).await
    }
}

/// Build a harness with both worker hosts registered.
pub async fn harness() -> TestHarness {
    let runtime = Arc::new(Runtime::new());
    let store = Arc::new(MemoryStore::new());
    let faults = Arc::new(ScriptedFaults::new());

    let store_port: Arc<dyn OrderStore> = store.clone();
    let faults_port: Arc<dyn FaultInjector> = faults.clone();

    runtime
        .register_worker(Worker::new(
            ORDERS_TASK_QUEUE,
            orders_activities(store_port.clone(), faults_port.clone()),
            WorkerOptions::default(),
        ))
        .await;
    runtime
        .register_worker(Worker::new(
            SHIPPING_TASK_QUEUE,
            shipping_activities(store_port, faults_port),
            WorkerOptions::default(),
        ))
        .await;

    TestHarness {
        runtime,
        store,
        faults,
    }
}

/// Fresh order id per test so runs never collide.
pub fn unique_order_id() -> String {
    format!("o-{}", Uuid::now_v7().simple())
}

/// Start payload matching the admission layer's shape.
pub fn start_input(order_id: &str) -> StartOrderInput {
    StartOrderInput {
        order_id: order_id.to_string(),
        payment_id: format!("pay-{order_id}"),
        address: Some(serde_json::json!({"line1": "123 Main", "city": "Chicago"})),
        items: Some(vec![trellis_domain::OrderItem {
            sku: "ABC".to_string(),
            qty: 1,
        }]),
    }
}
