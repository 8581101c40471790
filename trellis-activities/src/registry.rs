//! Activity registries for the two task queues.

use std::sync::Arc;
use trellis_engine::ActivityRegistry;
use trellis_store::OrderStore;

use crate::fault::FaultInjector;
use crate::handlers;
use crate::names;

macro_rules! bind {
    ($registry:expr, $name:expr, $handler:path, $store:expr, $faults:expr) => {{
        let store = Arc::clone($store);
        let faults = Arc::clone($faults);
        $registry.register($name, move |payload| {
            let store = store.clone();
            let faults = faults.clone();
            async move { $handler(store.as_ref(), faults.as_ref(), payload).await }
        });
    }};
}

/// Activities bound by the orders host.
pub fn orders_activities(
    store: Arc<dyn OrderStore>,
    faults: Arc<dyn FaultInjector>,
) -> ActivityRegistry {
    let mut registry = ActivityRegistry::new();
    bind!(registry, names::RECEIVE_ORDER, handlers::receive_order, &store, &faults);
    bind!(registry, names::VALIDATE_ORDER, handlers::validate_order, &store, &faults);
    bind!(registry, names::CHARGE_PAYMENT, handlers::charge_payment, &store, &faults);
    bind!(registry, names::PERSIST_ADDRESS, handlers::persist_address, &store, &faults);
    bind!(registry, names::MARK_SHIPPED, handlers::mark_shipped, &store, &faults);
    registry
}

/// Activities bound by the shipping host.
pub fn shipping_activities(
    store: Arc<dyn OrderStore>,
    faults: Arc<dyn FaultInjector>,
) -> ActivityRegistry {
    let mut registry = ActivityRegistry::new();
    bind!(registry, names::PREPARE_PACKAGE, handlers::prepare_package, &store, &faults);
    bind!(registry, names::DISPATCH_CARRIER, handlers::dispatch_carrier, &store, &faults);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::NoFaults;
    use trellis_store::MemoryStore;

    #[test]
    fn test_registries_cover_their_queues() {
        let store: Arc<dyn OrderStore> = Arc::new(MemoryStore::new());
        let faults: Arc<dyn FaultInjector> = Arc::new(NoFaults);

        let orders = orders_activities(store.clone(), faults.clone());
        assert_eq!(orders.len(), 5);
        assert!(orders.get(names::RECEIVE_ORDER).is_some());
        assert!(orders.get(names::PREPARE_PACKAGE).is_none());

        let shipping = shipping_activities(store, faults);
        assert_eq!(shipping.len(), 2);
        assert!(shipping.get(names::DISPATCH_CARRIER).is_some());
        assert!(shipping.get(names::CHARGE_PAYMENT).is_none());
    }
}
