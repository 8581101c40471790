//! Trellis Daemon
//!
//! Hosts the order orchestration runtime: admission API, orders worker
//! host, and shipping worker host.
//!
//! # Usage
//!
//! ```bash
//! # Start daemon with default configuration
//! trellisd
//!
//! # Database migrations
//! trellisd db migrate
//! trellisd db status
//!
//! # Start with custom environment
//! TRELLIS_ENV=test TRELLIS_API_PORT=8081 trellisd
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (or `TRELLIS_DB_HOST`,
//!   `TRELLIS_DB_PORT`, `TRELLIS_DB_USER`, `TRELLIS_DB_PASSWORD`,
//!   `TRELLIS_DB_NAME`); without either, the in-memory store is used
//! - `TRELLIS_ENV`: Environment (test, development, production)
//! - `TRELLIS_API_HOST`: API host (default: 0.0.0.0)
//! - `TRELLIS_API_PORT`: API port (default: 8080)
//! - `TRELLIS_ORDERS_TQ`: Orders task queue (default: orders-tq)
//! - `TRELLIS_SHIPPING_TQ`: Shipping task queue (default: shipping-tq)
//! - `TRELLIS_MAX_CONCURRENT_ACTIVITIES`: per host (default: 50)
//! - `TRELLIS_MAX_CONCURRENT_WORKFLOW_TASKS`: per host (default: 20)
//! - `TRELLIS_FAULT_INJECTION`: enable the random fault injector

mod db;

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trellis_activities::{ChaosFaults, FaultInjector, NoFaults};
use trellis_store::{MemoryStore, OrderStore, PgOrderStore};
use trellisd::{Config, Daemon};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("trellisd=info".parse()?))
        .init();

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for db subcommand
    if args.len() > 1 && args[1] == "db" {
        return db::run_db_command(args).await;
    }

    // Default: run daemon
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        orders_queue = %config.queues.orders,
        shipping_queue = %config.queues.shipping,
        "Trellis Daemon"
    );

    let store: Arc<dyn OrderStore> = match &config.db.url {
        Some(url) => {
            info!("PostgreSQL configured, connecting");
            let store = PgOrderStore::connect(url).await?;
            trellis_db::migrate(store.pool()).await?;
            Arc::new(store)
        }
        None => {
            warn!("No database configured, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let faults: Arc<dyn FaultInjector> = if config.fault_injection {
        info!("Fault injection enabled");
        Arc::new(ChaosFaults::new())
    } else {
        Arc::new(NoFaults)
    };

    let daemon = Daemon::new(config, store, faults);
    daemon.run().await?;

    Ok(())
}
