//! Domain model for the Trellis order orchestrator.
//!
//! Pure types shared by the store, the activities, and the workflows:
//! order lifecycle states, audit event kinds, payment charge outcomes,
//! the workflow status snapshot, and the activity/workflow wire payloads.

mod error;
mod events;
mod order;
mod payloads;
mod payment;
mod status;

pub use error::DomainError;
pub use events::EventKind;
pub use order::{OrderItem, OrderRecord, OrderState, ShipmentStatus};
pub use payloads::{
    ChargePaymentInput, MarkShippedInput, PersistAddressInput, ReceiveOrderInput, ShippingInput,
    StartOrderInput,
};
pub use payment::{ChargeOutcome, PaymentStatus};
pub use status::OrderSnapshot;
