//! Persistence gateway for orders, events, payments, and shipments.
//!
//! `OrderStore` is the port the activities program against. Two
//! implementations ship:
//! - `PgOrderStore`: sqlx/PostgreSQL, one tight transaction per operation
//! - `MemoryStore`: in-memory, for tests and engine-less development

mod error;
mod memory;
mod postgres;
mod repository;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgOrderStore;
pub use repository::{EventRow, OrderRow, OrderStore, PaymentRow, ShipmentRow};
