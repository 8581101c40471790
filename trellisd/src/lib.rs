//! Trellis daemon: admission API plus the two worker hosts.

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod workers;

pub use config::{Config, Environment};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
