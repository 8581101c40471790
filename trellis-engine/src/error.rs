//! Engine errors.

use thiserror::Error;

/// Errors surfaced by the execution runtime to workflow code and clients.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No worker is registered for the task queue
    #[error("no worker registered for task queue: {0}")]
    QueueNotFound(String),

    /// The worker for the queue does not host this activity
    #[error("activity not registered: {0}")]
    ActivityNotFound(String),

    /// No workflow with this id is known to the runtime
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// A workflow with this id is already running
    #[error("workflow already started: {0}")]
    WorkflowAlreadyStarted(String),

    /// The workflow does not handle this signal
    #[error("workflow {workflow_id} has no signal named {signal}")]
    UnknownSignal { workflow_id: String, signal: String },

    /// The activity exhausted its retry policy (or failed non-retryably)
    #[error("activity {name} failed after {attempts} attempt(s): {reason}")]
    ActivityFailed {
        name: String,
        attempts: u32,
        reason: String,
    },

    /// The activity's schedule-to-close budget elapsed across attempts
    #[error("activity {name} exceeded schedule_to_close after {attempts} attempt(s)")]
    ActivityScheduleTimeout { name: String, attempts: u32 },

    /// The workflow exceeded its run timeout
    #[error("workflow {0} exceeded run timeout")]
    RunTimeout(String),

    /// A workflow or activity payload failed to encode/decode
    #[error("payload error: {0}")]
    Payload(String),

    /// The worker stopped accepting tasks
    #[error("worker unavailable for task queue: {0}")]
    WorkerUnavailable(String),

    /// The workflow task aborted or panicked
    #[error("workflow task failed: {0}")]
    Task(String),
}
