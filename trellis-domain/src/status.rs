//! Workflow status snapshot returned by the `status` query.

use serde::{Deserialize, Serialize};

/// Point-in-time view of an order workflow's in-memory state.
///
/// `order_id` is empty until the run hydrates the state from its start
/// payload; everything else reflects signals and completed steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub step: String,
    pub approved: bool,
    pub canceled: bool,
    pub cancel_reason: Option<String>,
    pub child_attempts: u32,
    pub last_error: Option<String>,
    pub dispatch_failed_reason: Option<String>,
}
