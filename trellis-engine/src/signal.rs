//! Signal routing.
//!
//! A workflow wires its signal handlers at construction time, before the
//! run is spawned. Handlers merge the signal payload into the workflow's
//! shared state; the run loop observes the result at its next checkpoint.

use serde_json::Value;
use std::collections::HashMap;

pub type SignalHandler = Box<dyn Fn(Value) + Send + Sync>;

/// Immutable set of named signal handlers for one workflow instance.
pub struct SignalRouter {
    handlers: HashMap<String, SignalHandler>,
}

impl SignalRouter {
    pub fn builder() -> SignalRouterBuilder {
        SignalRouterBuilder {
            handlers: HashMap::new(),
        }
    }

    /// Deliver a signal. Returns false when the workflow has no handler
    /// with this name.
    pub fn deliver(&self, name: &str, payload: Value) -> bool {
        match self.handlers.get(name) {
            Some(handler) => {
                handler(payload);
                true
            }
            None => false,
        }
    }
}

pub struct SignalRouterBuilder {
    handlers: HashMap<String, SignalHandler>,
}

impl SignalRouterBuilder {
    pub fn on<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Box::new(handler));
        self
    }

    pub fn build(self) -> SignalRouter {
        SignalRouter {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_deliver_invokes_handler() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        let router = SignalRouter::builder()
            .on("approve", move |_| flag.store(true, Ordering::SeqCst))
            .build();

        assert!(router.deliver("approve", Value::Null));
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_deliver_unknown_signal_is_rejected() {
        let router = SignalRouter::builder().build();
        assert!(!router.deliver("approve", json!({})));
    }
}
