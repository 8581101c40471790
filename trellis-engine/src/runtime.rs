//! Workflow runtime: worker registry, workflow handles, lifecycle.

use crate::context::WorkflowCtx;
use crate::error::EngineError;
use crate::signal::SignalRouter;
use crate::worker::Worker;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Side-effect-free query against a workflow's shared state.
pub type QueryFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Options for starting a workflow run.
#[derive(Debug, Clone)]
pub struct StartOptions {
    pub workflow_id: String,
    pub task_queue: String,
    pub run_timeout: Duration,
}

enum OutcomeSlot {
    Pending(JoinHandle<Result<String, EngineError>>),
    Done(Result<String, EngineError>),
}

/// Client-side handle to a workflow: signal it, query it, await its result.
///
/// Handles outlive the run, so status stays queryable after completion.
#[derive(Clone)]
pub struct WorkflowHandle {
    pub workflow_id: String,
    pub run_id: Uuid,
    signals: Arc<SignalRouter>,
    query: QueryFn,
    outcome: Arc<Mutex<OutcomeSlot>>,
}

impl std::fmt::Debug for WorkflowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowHandle")
            .field("workflow_id", &self.workflow_id)
            .field("run_id", &self.run_id)
            .finish()
    }
}

impl WorkflowHandle {
    /// Deliver a named signal. The payload is merged into the workflow's
    /// state immediately; the run observes it at its next checkpoint.
    pub fn signal(&self, name: &str, payload: Value) -> Result<(), EngineError> {
        if self.signals.deliver(name, payload) {
            Ok(())
        } else {
            Err(EngineError::UnknownSignal {
                workflow_id: self.workflow_id.clone(),
                signal: name.to_string(),
            })
        }
    }

    /// Snapshot the workflow's queryable state.
    pub fn query(&self) -> Value {
        (self.query)()
    }

    /// Await the workflow result. Subsequent calls return the cached outcome.
    pub async fn result(&self) -> Result<String, EngineError> {
        let mut slot = self.outcome.lock().await;
        match &mut *slot {
            OutcomeSlot::Done(result) => result.clone(),
            OutcomeSlot::Pending(task) => {
                let result = match task.await {
                    Ok(result) => result,
                    Err(join_err) => Err(EngineError::Task(join_err.to_string())),
                };
                *slot = OutcomeSlot::Done(result.clone());
                result
            }
        }
    }

    pub fn is_running(&self) -> bool {
        match self.outcome.try_lock() {
            Ok(slot) => match &*slot {
                OutcomeSlot::Pending(task) => !task.is_finished(),
                OutcomeSlot::Done(_) => false,
            },
            // Lock held means a caller is awaiting the result
            Err(_) => true,
        }
    }
}

/// The in-process execution runtime.
///
/// Holds one worker per task queue and one handle per workflow id.
#[derive(Default)]
pub struct Runtime {
    workers: RwLock<HashMap<String, Arc<Worker>>>,
    handles: RwLock<HashMap<String, WorkflowHandle>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a worker to its task queue. Replaces any previous worker on
    /// the same queue.
    pub async fn register_worker(&self, worker: Worker) {
        let queue = worker.task_queue().to_string();
        info!(task_queue = %queue, "worker registered");
        self.workers.write().await.insert(queue, Arc::new(worker));
    }

    pub(crate) async fn worker(&self, task_queue: &str) -> Result<Arc<Worker>, EngineError> {
        self.workers
            .read()
            .await
            .get(task_queue)
            .cloned()
            .ok_or_else(|| EngineError::QueueNotFound(task_queue.to_string()))
    }

    /// Look up a live or finished workflow by id.
    pub async fn handle(&self, workflow_id: &str) -> Result<WorkflowHandle, EngineError> {
        self.handles
            .read()
            .await
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| EngineError::WorkflowNotFound(workflow_id.to_string()))
    }

    /// Deliver a signal to a workflow by id.
    pub async fn signal_workflow(
        &self,
        workflow_id: &str,
        name: &str,
        payload: Value,
    ) -> Result<(), EngineError> {
        self.handle(workflow_id).await?.signal(name, payload)
    }

    /// Start a workflow run on its task queue.
    ///
    /// The run executes under one of the queue's workflow slots and is
    /// bounded end-to-end by `run_timeout`. Starting a second run with
    /// the id of a still-running workflow is rejected.
    pub async fn start_workflow<F, Fut>(
        self: &Arc<Self>,
        options: StartOptions,
        signals: Arc<SignalRouter>,
        query: QueryFn,
        run: F,
    ) -> Result<WorkflowHandle, EngineError>
    where
        F: FnOnce(WorkflowCtx) -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, EngineError>> + Send + 'static,
    {
        if let Some(existing) = self.handles.read().await.get(&options.workflow_id) {
            if existing.is_running() {
                return Err(EngineError::WorkflowAlreadyStarted(options.workflow_id));
            }
        }

        let worker = self.worker(&options.task_queue).await?;
        let ctx = WorkflowCtx::new(
            self.clone(),
            options.workflow_id.clone(),
            options.task_queue.clone(),
        );

        let workflow_id = options.workflow_id.clone();
        let task_queue = options.task_queue.clone();
        let run_timeout = options.run_timeout;

        debug!(workflow_id = %workflow_id, task_queue = %task_queue, "workflow starting");

        let task = tokio::spawn(async move {
            let bounded = async {
                let _slot = worker
                    .workflow_slots()
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| EngineError::WorkerUnavailable(task_queue))?;
                run(ctx).await
            };
            match tokio::time::timeout(run_timeout, bounded).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::RunTimeout(workflow_id)),
            }
        });

        let handle = WorkflowHandle {
            workflow_id: options.workflow_id.clone(),
            run_id: Uuid::now_v7(),
            signals,
            query,
            outcome: Arc::new(Mutex::new(OutcomeSlot::Pending(task))),
        };

        self.handles
            .write()
            .await
            .insert(options.workflow_id, handle.clone());

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityRegistry;
    use crate::worker::WorkerOptions;

    fn empty_query() -> QueryFn {
        Arc::new(|| Value::Null)
    }

    async fn runtime_with_queue(queue: &str) -> Arc<Runtime> {
        let runtime = Arc::new(Runtime::new());
        runtime
            .register_worker(Worker::new(
                queue,
                ActivityRegistry::new(),
                WorkerOptions::default(),
            ))
            .await;
        runtime
    }

    #[tokio::test]
    async fn test_start_and_await_result() {
        let runtime = runtime_with_queue("test-tq").await;

        let handle = runtime
            .start_workflow(
                StartOptions {
                    workflow_id: "wf-1".to_string(),
                    task_queue: "test-tq".to_string(),
                    run_timeout: Duration::from_secs(5),
                },
                Arc::new(SignalRouter::builder().build()),
                empty_query(),
                |_ctx| async { Ok("done".to_string()) },
            )
            .await
            .unwrap();

        assert_eq!(handle.result().await.unwrap(), "done");
        // Cached outcome on second await
        assert_eq!(handle.result().await.unwrap(), "done");
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_unknown_queue_is_rejected() {
        let runtime = Arc::new(Runtime::new());

        let err = runtime
            .start_workflow(
                StartOptions {
                    workflow_id: "wf-1".to_string(),
                    task_queue: "nowhere".to_string(),
                    run_timeout: Duration::from_secs(1),
                },
                Arc::new(SignalRouter::builder().build()),
                empty_query(),
                |_ctx| async { Ok(String::new()) },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::QueueNotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_running_workflow_is_rejected() {
        let runtime = runtime_with_queue("test-tq").await;
        let options = StartOptions {
            workflow_id: "wf-dup".to_string(),
            task_queue: "test-tq".to_string(),
            run_timeout: Duration::from_secs(30),
        };

        let handle = runtime
            .start_workflow(
                options.clone(),
                Arc::new(SignalRouter::builder().build()),
                empty_query(),
                |_ctx| async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Ok("slow".to_string())
                },
            )
            .await
            .unwrap();

        let err = runtime
            .start_workflow(
                options,
                Arc::new(SignalRouter::builder().build()),
                empty_query(),
                |_ctx| async { Ok(String::new()) },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::WorkflowAlreadyStarted(_)));
        drop(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_timeout_bounds_the_workflow() {
        let runtime = runtime_with_queue("test-tq").await;

        let handle = runtime
            .start_workflow(
                StartOptions {
                    workflow_id: "wf-slow".to_string(),
                    task_queue: "test-tq".to_string(),
                    run_timeout: Duration::from_secs(1),
                },
                Arc::new(SignalRouter::builder().build()),
                empty_query(),
                |ctx| async move {
                    ctx.sleep(Duration::from_secs(60)).await;
                    Ok("never".to_string())
                },
            )
            .await
            .unwrap();

        let err = handle.result().await.unwrap_err();
        assert!(matches!(err, EngineError::RunTimeout(_)));
    }

    #[tokio::test]
    async fn test_signal_workflow_routes_by_id() {
        let runtime = runtime_with_queue("test-tq").await;
        let seen = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = seen.clone();

        let router = Arc::new(
            SignalRouter::builder()
                .on("poke", move |_| {
                    flag.store(true, std::sync::atomic::Ordering::SeqCst)
                })
                .build(),
        );

        runtime
            .start_workflow(
                StartOptions {
                    workflow_id: "wf-sig".to_string(),
                    task_queue: "test-tq".to_string(),
                    run_timeout: Duration::from_secs(5),
                },
                router,
                empty_query(),
                |_ctx| async { Ok(String::new()) },
            )
            .await
            .unwrap();

        runtime
            .signal_workflow("wf-sig", "poke", Value::Null)
            .await
            .unwrap();
        assert!(seen.load(std::sync::atomic::Ordering::SeqCst));

        let err = runtime
            .signal_workflow("wf-sig", "missing", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownSignal { .. }));

        let err = runtime
            .signal_workflow("absent", "poke", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::WorkflowNotFound(_)));
    }
}
