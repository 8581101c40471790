//! Order orchestration workflows.
//!
//! `OrderWorkflow` drives an order from receipt through validation, the
//! manual-review gate, payment, shipping (a child workflow on its own
//! task queue), and the final shipped mark, reacting to approve/cancel/
//! address signals along the way. `ShippingWorkflow` is the two-step
//! child that back-signals its parent when carrier dispatch fails
//! terminally.

mod options;
mod order;
mod shipping;

pub use options::{
    activity_options, ACTIVITY_SCHEDULE_TO_CLOSE, ACTIVITY_START_TO_CLOSE, MANUAL_REVIEW_WINDOW,
    MAX_CHILD_ATTEMPTS, ORDERS_TASK_QUEUE, ORDER_RUN_TIMEOUT, REVIEW_POLL_INTERVAL,
    SHIPPING_RUN_TIMEOUT, SHIPPING_TASK_QUEUE, SIGNAL_APPROVE, SIGNAL_CANCEL,
    SIGNAL_DISPATCH_FAILED, SIGNAL_UPDATE_ADDRESS,
};
pub use order::{order_workflow_id, start_order, OrderWorkflow};
pub use shipping::ShippingWorkflow;
