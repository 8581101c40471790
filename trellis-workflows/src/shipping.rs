//! Shipping child workflow: prepare package, dispatch carrier.

use crate::options::{activity_options, SHIPPING_RUN_TIMEOUT, SIGNAL_DISPATCH_FAILED};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;
use trellis_activities::names;
use trellis_domain::ShippingInput;
use trellis_engine::{EngineError, QueryFn, SignalRouter, StartOptions, WorkflowCtx};

/// Two-step sub-orchestrator running on the shipping task queue.
///
/// Exposes no signals or queries of its own. On terminal dispatch
/// failure it notifies the parent via the `dispatch_failed` back-signal
/// and then propagates the failure, so the parent's retry loop is driven
/// by the child's own outcome rather than the signal.
pub struct ShippingWorkflow;

impl ShippingWorkflow {
    pub async fn run(ctx: WorkflowCtx, input: ShippingInput) -> Result<String, EngineError> {
        let options = activity_options();

        let order = serde_json::to_value(&input.order)
            .map_err(|e| EngineError::Payload(e.to_string()))?;

        ctx.execute_activity(names::PREPARE_PACKAGE, order.clone(), &options)
            .await?;

        if let Err(failure) = ctx
            .execute_activity(names::DISPATCH_CARRIER, order, &options)
            .await
        {
            let reason = failure.to_string();
            if let Err(signal_err) = ctx
                .signal_external(
                    &input.parent_workflow_id,
                    SIGNAL_DISPATCH_FAILED,
                    Value::String(reason),
                )
                .await
            {
                warn!(
                    parent_workflow_id = %input.parent_workflow_id,
                    error = %signal_err,
                    "could not deliver dispatch_failed to parent"
                );
            }
            return Err(failure);
        }

        Ok("dispatched".to_string())
    }

    /// Start this workflow as a child of `ctx` and await its result.
    pub async fn execute(
        ctx: &WorkflowCtx,
        input: ShippingInput,
        child_id: String,
        task_queue: &str,
    ) -> Result<String, EngineError> {
        let signals = Arc::new(SignalRouter::builder().build());
        let query: QueryFn = Arc::new(|| Value::Null);

        ctx.execute_child(
            StartOptions {
                workflow_id: child_id,
                task_queue: task_queue.to_string(),
                run_timeout: SHIPPING_RUN_TIMEOUT,
            },
            signals,
            query,
            move |child_ctx| ShippingWorkflow::run(child_ctx, input),
        )
        .await
    }
}
