//! Orchestration constants: task queues, signal names, timeouts.

use std::time::Duration;
use trellis_engine::{ActivityOptions, RetryPolicy};

pub const ORDERS_TASK_QUEUE: &str = "orders-tq";
pub const SHIPPING_TASK_QUEUE: &str = "shipping-tq";

pub const SIGNAL_APPROVE: &str = "approve";
pub const SIGNAL_CANCEL: &str = "cancel_order";
pub const SIGNAL_UPDATE_ADDRESS: &str = "update_address";
pub const SIGNAL_DISPATCH_FAILED: &str = "dispatch_failed";

pub const ACTIVITY_START_TO_CLOSE: Duration = Duration::from_secs(2);
pub const ACTIVITY_SCHEDULE_TO_CLOSE: Duration = Duration::from_secs(8);

/// How long the manual-review gate waits for an approve signal.
pub const MANUAL_REVIEW_WINDOW: Duration = Duration::from_secs(3);
/// Tick of the review loop; cancel is also honored per tick.
pub const REVIEW_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const ORDER_RUN_TIMEOUT: Duration = Duration::from_secs(15);
pub const SHIPPING_RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// Shipping child attempts before the order fails terminally.
pub const MAX_CHILD_ATTEMPTS: u32 = 2;

/// Timeouts and retry policy shared by every activity in the pipeline.
pub fn activity_options() -> ActivityOptions {
    ActivityOptions {
        start_to_close: ACTIVITY_START_TO_CLOSE,
        schedule_to_close: ACTIVITY_SCHEDULE_TO_CLOSE,
        retry: RetryPolicy::new(Duration::from_millis(500), 1.5, 2),
    }
}
