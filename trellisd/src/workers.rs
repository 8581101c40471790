//! Worker hosts.
//!
//! Two hosts, one per task queue: the orders host binds the order
//! workflow's activities to the orders queue, the shipping host binds the
//! shipping activities to the shipping queue. With the in-process runtime
//! they run as components of the daemon rather than separate OS
//! processes, but each is registered and tuned independently.

use std::sync::Arc;
use tracing::info;
use trellis_activities::{orders_activities, shipping_activities, FaultInjector};
use trellis_engine::{Runtime, Worker, WorkerOptions};
use trellis_store::OrderStore;

use crate::config::WorkerTuning;

fn worker_options(tuning: &WorkerTuning) -> WorkerOptions {
    WorkerOptions {
        max_concurrent_activities: tuning.max_concurrent_activities,
        max_concurrent_workflow_tasks: tuning.max_concurrent_workflow_tasks,
    }
}

/// Bind the orders host: `OrderWorkflow` plus receive/validate/charge/
/// persist-address/mark-shipped activities.
pub async fn register_orders_host(
    runtime: &Runtime,
    store: Arc<dyn OrderStore>,
    faults: Arc<dyn FaultInjector>,
    queue: &str,
    tuning: &WorkerTuning,
) {
    runtime
        .register_worker(Worker::new(
            queue,
            orders_activities(store, faults),
            worker_options(tuning),
        ))
        .await;

    info!(task_queue = %queue, "orders host started");
}

/// Bind the shipping host: `ShippingWorkflow` plus prepare-package and
/// dispatch-carrier activities.
pub async fn register_shipping_host(
    runtime: &Runtime,
    store: Arc<dyn OrderStore>,
    faults: Arc<dyn FaultInjector>,
    queue: &str,
    tuning: &WorkerTuning,
) {
    runtime
        .register_worker(Worker::new(
            queue,
            shipping_activities(store, faults),
            worker_options(tuning),
        ))
        .await;

    info!(task_queue = %queue, "shipping host started");
}
