//! Audit event kinds appended alongside every order mutation.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Tag of an append-only audit event. One row is written for every state
/// transition or side effect an activity performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OrderReceived,
    OrderValidated,
    PaymentCharged,
    PaymentIdempotent,
    PackagePrepared,
    CarrierDispatched,
    OrderShipped,
    AddressUpdated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::OrderReceived => "order_received",
            EventKind::OrderValidated => "order_validated",
            EventKind::PaymentCharged => "payment_charged",
            EventKind::PaymentIdempotent => "payment_idempotent",
            EventKind::PackagePrepared => "package_prepared",
            EventKind::CarrierDispatched => "carrier_dispatched",
            EventKind::OrderShipped => "order_shipped",
            EventKind::AddressUpdated => "address_updated",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_received" => Ok(EventKind::OrderReceived),
            "order_validated" => Ok(EventKind::OrderValidated),
            "payment_charged" => Ok(EventKind::PaymentCharged),
            "payment_idempotent" => Ok(EventKind::PaymentIdempotent),
            "package_prepared" => Ok(EventKind::PackagePrepared),
            "carrier_dispatched" => Ok(EventKind::CarrierDispatched),
            "order_shipped" => Ok(EventKind::OrderShipped),
            "address_updated" => Ok(EventKind::AddressUpdated),
            other => Err(DomainError::InvalidEventKind(other.to_string())),
        }
    }
}
