//! Workflow execution context.
//!
//! The context is the only gateway through which workflow code may
//! suspend: activity execution, durable sleeps, child workflows, and
//! external signals. Everything else in a workflow is synchronous
//! computation on in-memory state.

use crate::activity::{ActivityError, ActivityOptions};
use crate::error::EngineError;
use crate::runtime::{QueryFn, Runtime, StartOptions, WorkflowHandle};
use crate::signal::SignalRouter;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Per-run execution context handed to a workflow's `run`.
pub struct WorkflowCtx {
    runtime: Arc<Runtime>,
    workflow_id: String,
    task_queue: String,
}

impl WorkflowCtx {
    pub(crate) fn new(runtime: Arc<Runtime>, workflow_id: String, task_queue: String) -> Self {
        Self {
            runtime,
            workflow_id,
            task_queue,
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn task_queue(&self) -> &str {
        &self.task_queue
    }

    /// Current reading of the runtime clock.
    pub fn now(&self) -> Instant {
        Instant::now()
    }

    /// Durable sleep on the runtime clock.
    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Execute an activity on this workflow's task queue.
    ///
    /// Each attempt is bounded by `start_to_close`; the whole chain of
    /// attempts and backoffs is bounded by `schedule_to_close`. Transient
    /// failures and per-attempt timeouts retry per the policy;
    /// non-retryable failures fail immediately.
    pub async fn execute_activity(
        &self,
        name: &str,
        payload: Value,
        options: &ActivityOptions,
    ) -> Result<Value, EngineError> {
        let worker = self.runtime.worker(&self.task_queue).await?;
        let handler = worker
            .activity(name)
            .ok_or_else(|| EngineError::ActivityNotFound(name.to_string()))?;

        let deadline = Instant::now() + options.schedule_to_close;
        let mut attempt: u32 = 0;
        let mut last_reason = String::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(EngineError::ActivityScheduleTimeout {
                    name: name.to_string(),
                    attempts: attempt,
                });
            }
            attempt += 1;

            let attempt_budget = options.start_to_close.min(remaining);
            let outcome = {
                let _slot = worker
                    .activity_slots()
                    .acquire()
                    .await
                    .map_err(|_| EngineError::WorkerUnavailable(self.task_queue.clone()))?;
                tokio::time::timeout(attempt_budget, handler(payload.clone())).await
            };

            match outcome {
                Ok(Ok(value)) => {
                    debug!(activity = name, attempt, "activity completed");
                    return Ok(value);
                }
                Ok(Err(ActivityError::NonRetryable(reason))) => {
                    warn!(activity = name, attempt, %reason, "activity failed (non-retryable)");
                    return Err(EngineError::ActivityFailed {
                        name: name.to_string(),
                        attempts: attempt,
                        reason,
                    });
                }
                Ok(Err(ActivityError::Transient(reason))) => {
                    warn!(activity = name, attempt, %reason, "activity attempt failed");
                    last_reason = reason;
                }
                Err(_elapsed) => {
                    warn!(activity = name, attempt, "activity attempt timed out");
                    last_reason = format!(
                        "start_to_close elapsed after {:?}",
                        options.start_to_close
                    );
                }
            }

            if attempt >= options.retry.maximum_attempts {
                return Err(EngineError::ActivityFailed {
                    name: name.to_string(),
                    attempts: attempt,
                    reason: last_reason,
                });
            }
            tokio::time::sleep(options.retry.delay(attempt)).await;
        }
    }

    /// Start a child workflow on another task queue and await its result.
    pub async fn execute_child<F, Fut>(
        &self,
        options: StartOptions,
        signals: Arc<SignalRouter>,
        query: QueryFn,
        run: F,
    ) -> Result<String, EngineError>
    where
        F: FnOnce(WorkflowCtx) -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, EngineError>> + Send + 'static,
    {
        let handle: WorkflowHandle = self
            .runtime
            .start_workflow(options, signals, query, run)
            .await?;
        handle.result().await
    }

    /// Deliver a signal to another workflow by id.
    pub async fn signal_external(
        &self,
        workflow_id: &str,
        signal: &str,
        payload: Value,
    ) -> Result<(), EngineError> {
        self.runtime
            .signal_workflow(workflow_id, signal, payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityRegistry;
    use crate::retry::RetryPolicy;
    use crate::worker::{Worker, WorkerOptions};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn options() -> ActivityOptions {
        ActivityOptions {
            start_to_close: Duration::from_secs(2),
            schedule_to_close: Duration::from_secs(8),
            retry: RetryPolicy::new(Duration::from_millis(500), 1.5, 2),
        }
    }

    async fn ctx_with(registry: ActivityRegistry) -> WorkflowCtx {
        let runtime = Arc::new(Runtime::new());
        runtime
            .register_worker(Worker::new("test-tq", registry, WorkerOptions::default()))
            .await;
        WorkflowCtx::new(runtime, "wf-test".to_string(), "test-tq".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut registry = ActivityRegistry::new();
        registry.register("flaky", move |_payload| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ActivityError::transient("first attempt blip"))
                } else {
                    Ok(json!("ok"))
                }
            }
        });

        let ctx = ctx_with(registry).await;
        let result = ctx
            .execute_activity("flaky", Value::Null, &options())
            .await
            .unwrap();

        assert_eq!(result, json!("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhaust_into_failure() {
        let mut registry = ActivityRegistry::new();
        registry.register("doomed", |_payload| async {
            Err(ActivityError::transient("still broken"))
        });

        let ctx = ctx_with(registry).await;
        let err = ctx
            .execute_activity("doomed", Value::Null, &options())
            .await
            .unwrap_err();

        match err {
            EngineError::ActivityFailed {
                attempts, reason, ..
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(reason, "still broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut registry = ActivityRegistry::new();
        registry.register("invalid", move |_payload| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ActivityError::non_retryable("bad payload"))
            }
        });

        let ctx = ctx_with(registry).await;
        let err = ctx
            .execute_activity("invalid", Value::Null, &options())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::ActivityFailed { attempts: 1, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_to_close_timeout_counts_as_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut registry = ActivityRegistry::new();
        registry.register("stalled", move |_payload| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    // stall past start_to_close; the engine cuts this attempt
                    tokio::time::sleep(Duration::from_secs(300)).await;
                }
                Ok(json!("recovered"))
            }
        });

        let ctx = ctx_with(registry).await;
        let result = ctx
            .execute_activity("stalled", Value::Null, &options())
            .await
            .unwrap();

        assert_eq!(result, json!("recovered"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_to_close_bounds_the_attempt_chain() {
        let mut registry = ActivityRegistry::new();
        registry.register("molasses", |_payload| async {
            tokio::time::sleep(Duration::from_secs(300)).await;
            Ok(Value::Null)
        });

        let ctx = ctx_with(registry).await;
        let generous_retries = ActivityOptions {
            start_to_close: Duration::from_secs(2),
            schedule_to_close: Duration::from_secs(8),
            retry: RetryPolicy::new(Duration::from_millis(500), 1.5, 100),
        };

        let err = ctx
            .execute_activity("molasses", Value::Null, &generous_retries)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ActivityScheduleTimeout { .. }));
    }

    #[tokio::test]
    async fn test_unregistered_activity_is_rejected() {
        let ctx = ctx_with(ActivityRegistry::new()).await;
        let err = ctx
            .execute_activity("ghost", Value::Null, &options())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ActivityNotFound(_)));
    }
}
