//! Task-queue workers.
//!
//! A worker binds a set of activities to a named task queue and bounds
//! how much work runs concurrently on that queue.

use crate::activity::{ActivityHandler, ActivityRegistry};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Concurrency limits for one worker.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub max_concurrent_activities: usize,
    pub max_concurrent_workflow_tasks: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            max_concurrent_activities: 50,
            max_concurrent_workflow_tasks: 20,
        }
    }
}

/// A worker hosting activities (and workflow runs) for one task queue.
pub struct Worker {
    task_queue: String,
    activities: ActivityRegistry,
    activity_slots: Arc<Semaphore>,
    workflow_slots: Arc<Semaphore>,
}

impl Worker {
    pub fn new(
        task_queue: impl Into<String>,
        activities: ActivityRegistry,
        options: WorkerOptions,
    ) -> Self {
        Self {
            task_queue: task_queue.into(),
            activities,
            activity_slots: Arc::new(Semaphore::new(options.max_concurrent_activities)),
            workflow_slots: Arc::new(Semaphore::new(options.max_concurrent_workflow_tasks)),
        }
    }

    pub fn task_queue(&self) -> &str {
        &self.task_queue
    }

    pub(crate) fn activity(&self, name: &str) -> Option<ActivityHandler> {
        self.activities.get(name)
    }

    pub(crate) fn activity_slots(&self) -> &Arc<Semaphore> {
        &self.activity_slots
    }

    pub(crate) fn workflow_slots(&self) -> &Arc<Semaphore> {
        &self.workflow_slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_defaults_match_host_tuning() {
        let options = WorkerOptions::default();
        assert_eq!(options.max_concurrent_activities, 50);
        assert_eq!(options.max_concurrent_workflow_tasks, 20);

        let worker = Worker::new("orders-tq", ActivityRegistry::new(), options);
        assert_eq!(worker.task_queue(), "orders-tq");
        assert_eq!(worker.activity_slots().available_permits(), 50);
        assert_eq!(worker.workflow_slots().available_permits(), 20);
    }
}
