//! Activity registration and failure classification.

use crate::retry::RetryPolicy;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single activity attempt.
///
/// Transient failures (and start-to-close expiries) are retried within
/// the activity's retry policy; non-retryable failures fail the
/// activity immediately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActivityError {
    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    NonRetryable(String),
}

impl ActivityError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient(reason.into())
    }

    pub fn non_retryable(reason: impl Into<String>) -> Self {
        Self::NonRetryable(reason.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ActivityError::Transient(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            ActivityError::Transient(reason) | ActivityError::NonRetryable(reason) => reason,
        }
    }
}

/// Timeouts and retry policy for one activity execution.
#[derive(Debug, Clone)]
pub struct ActivityOptions {
    /// Budget for a single attempt
    pub start_to_close: Duration,
    /// Budget for the whole attempt chain, backoffs included
    pub schedule_to_close: Duration,
    pub retry: RetryPolicy,
}

pub type ActivityFuture = Pin<Box<dyn Future<Output = Result<Value, ActivityError>> + Send>>;

/// A registered activity: one JSON payload in, one JSON result out.
pub type ActivityHandler = Arc<dyn Fn(Value) -> ActivityFuture + Send + Sync>;

/// Activities hosted by one worker, keyed by name.
#[derive(Default)]
pub struct ActivityRegistry {
    handlers: HashMap<String, ActivityHandler>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, name: &str, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ActivityError>> + Send + 'static,
    {
        self.handlers
            .insert(name.to_string(), Arc::new(move |payload| Box::pin(handler(payload))));
    }

    pub fn get(&self, name: &str) -> Option<ActivityHandler> {
        self.handlers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_registry_dispatches_by_name() {
        let mut registry = ActivityRegistry::new();
        registry.register("echo", |payload| async move { Ok(payload) });

        let handler = registry.get("echo").unwrap();
        let result = handler(json!({"hello": "world"})).await.unwrap();
        assert_eq!(result, json!({"hello": "world"}));

        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_error_classification() {
        assert!(ActivityError::transient("blip").is_retryable());
        assert!(!ActivityError::non_retryable("bad input").is_retryable());
        assert_eq!(ActivityError::transient("blip").reason(), "blip");
    }
}
