//! In-process durable-execution boundary for Trellis workflows.
//!
//! The production system treats the execution engine as an external
//! collaborator; this crate is the contract the orchestrators program
//! against, plus the minimal in-process runtime that hosts them:
//!
//! - named task queues with per-queue workers and concurrency limits
//! - activity dispatch with retry policy, start-to-close and
//!   schedule-to-close timeouts
//! - signal routing into a workflow's shared state (handlers are wired
//!   at construction, so signals arriving before `run` are absorbed)
//! - side-effect-free status queries against live or finished workflows
//! - child workflows on separate queues with their own run timeouts
//!
//! Workflow code suspends only at `WorkflowCtx` operations: activity
//! execution, sleeps, child workflows, and external signals. Timers use
//! the runtime clock (`tokio::time`), which test environments can pause
//! and auto-advance.

mod activity;
mod context;
mod error;
mod retry;
mod runtime;
mod signal;
mod worker;

pub use activity::{ActivityError, ActivityFuture, ActivityHandler, ActivityOptions, ActivityRegistry};
pub use context::WorkflowCtx;
pub use error::EngineError;
pub use retry::RetryPolicy;
pub use runtime::{QueryFn, Runtime, StartOptions, WorkflowHandle};
pub use signal::{SignalRouter, SignalRouterBuilder};
pub use worker::{Worker, WorkerOptions};
