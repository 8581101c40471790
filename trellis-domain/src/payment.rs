//! Payment charge outcome types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status of a payment row. The ledger only ever records settled charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Charged,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Charged => "charged",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an idempotent charge. When `was_new` is false the charge
/// collapsed onto an existing row and `amount` is the stored amount,
/// which is authoritative over whatever the retry computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeOutcome {
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub was_new: bool,
}
