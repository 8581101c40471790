//! Fault injection for activity bodies.
//!
//! The retry policy and timeouts upstream are sized against `ChaosFaults`:
//! roughly a third of invocations fail outright, a third stall long enough
//! to trip the start-to-close timeout, and the rest pass.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use trellis_engine::ActivityError;

/// Hook called at the top of every activity body.
#[async_trait]
pub trait FaultInjector: Send + Sync {
    async fn inject(&self, activity: &str) -> Result<(), ActivityError>;
}

/// Pass-through injector (tests, and production defaults).
pub struct NoFaults;

#[async_trait]
impl FaultInjector for NoFaults {
    async fn inject(&self, _activity: &str) -> Result<(), ActivityError> {
        Ok(())
    }
}

/// Random failure/stall injector for exercising the retry machinery.
pub struct ChaosFaults {
    stall: Duration,
}

impl ChaosFaults {
    pub fn new() -> Self {
        Self {
            stall: Duration::from_secs(300),
        }
    }

    pub fn with_stall(stall: Duration) -> Self {
        Self { stall }
    }
}

impl Default for ChaosFaults {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaultInjector for ChaosFaults {
    async fn inject(&self, activity: &str) -> Result<(), ActivityError> {
        let roll: f64 = rand::random();
        if roll < 0.33 {
            return Err(ActivityError::transient(format!(
                "injected failure in {activity}"
            )));
        }
        if roll < 0.67 {
            // Outlive start_to_close; the engine cuts the attempt
            tokio::time::sleep(self.stall).await;
        }
        Ok(())
    }
}

enum FaultPlan {
    Remaining(u32),
    Always,
}

/// Deterministic per-activity failure scripting for tests.
#[derive(Default)]
pub struct ScriptedFaults {
    plans: Mutex<HashMap<String, FaultPlan>>,
}

impl ScriptedFaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` invocations of `activity`, then pass.
    pub fn fail(&self, activity: &str, times: u32) {
        self.plans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(activity.to_string(), FaultPlan::Remaining(times));
    }

    /// Fail every invocation of `activity`.
    pub fn always_fail(&self, activity: &str) {
        self.plans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(activity.to_string(), FaultPlan::Always);
    }
}

#[async_trait]
impl FaultInjector for ScriptedFaults {
    async fn inject(&self, activity: &str) -> Result<(), ActivityError> {
        let mut plans = self
            .plans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match plans.get_mut(activity) {
            Some(FaultPlan::Always) => Err(ActivityError::transient(format!(
                "injected failure in {activity}"
            ))),
            Some(FaultPlan::Remaining(left)) if *left > 0 => {
                *left -= 1;
                Err(ActivityError::transient(format!(
                    "injected failure in {activity}"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_faults_passes() {
        assert!(NoFaults.inject("receive_order").await.is_ok());
    }

    #[tokio::test]
    async fn test_scripted_faults_count_down() {
        let faults = ScriptedFaults::new();
        faults.fail("dispatch_carrier", 2);

        assert!(faults.inject("dispatch_carrier").await.is_err());
        assert!(faults.inject("dispatch_carrier").await.is_err());
        assert!(faults.inject("dispatch_carrier").await.is_ok());
        // Unscripted activities are untouched
        assert!(faults.inject("prepare_package").await.is_ok());
    }

    #[tokio::test]
    async fn test_scripted_always_fail() {
        let faults = ScriptedFaults::new();
        faults.always_fail("dispatch_carrier");

        for _ in 0..5 {
            assert!(faults.inject("dispatch_carrier").await.is_err());
        }
    }
}
