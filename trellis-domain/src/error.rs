//! Domain errors.

use thiserror::Error;

/// Errors arising from domain-level parsing and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Unknown order or shipment state tag
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Unknown audit event tag
    #[error("invalid event kind: {0}")]
    InvalidEventKind(String),

    /// Order failed validation
    #[error("invalid order: {0}")]
    InvalidOrder(String),
}
