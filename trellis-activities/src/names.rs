//! Activity names as they are registered on the task queues.

pub const RECEIVE_ORDER: &str = "receive_order";
pub const VALIDATE_ORDER: &str = "validate_order";
pub const CHARGE_PAYMENT: &str = "charge_payment";
pub const PERSIST_ADDRESS: &str = "persist_address";
pub const MARK_SHIPPED: &str = "mark_shipped";
pub const PREPARE_PACKAGE: &str = "prepare_package";
pub const DISPATCH_CARRIER: &str = "dispatch_carrier";
