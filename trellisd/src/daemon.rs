//! Daemon: main runtime orchestrator.
//!
//! Ties together the workflow runtime, the two worker hosts, and the
//! admission API server.
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Register the orders and shipping hosts on their task queues
//! 3. Start the API server
//! 4. Block until shutdown is requested (SIGINT)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use trellis_activities::FaultInjector;
use trellis_engine::Runtime;
use trellis_store::OrderStore;

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};
use crate::workers::{register_orders_host, register_shipping_host};

// =============================================================================
// Daemon
// =============================================================================

/// The Trellis daemon.
pub struct Daemon {
    config: Config,
    runtime: Arc<Runtime>,
    store: Arc<dyn OrderStore>,
    faults: Arc<dyn FaultInjector>,
}

impl Daemon {
    /// Create a daemon over the given store and fault injector.
    pub fn new(config: Config, store: Arc<dyn OrderStore>, faults: Arc<dyn FaultInjector>) -> Self {
        Self {
            config,
            runtime: Arc::new(Runtime::new()),
            store,
            faults,
        }
    }

    /// Create a daemon on the in-memory store (tests/development).
    pub fn new_in_memory(config: Config) -> Self {
        Self::new(
            config,
            Arc::new(trellis_store::MemoryStore::new()),
            Arc::new(trellis_activities::NoFaults),
        )
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Run the daemon. Blocks until shutdown is requested.
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            "Starting Trellis daemon"
        );

        self.register_hosts().await;

        let api_addr = self.start_api_server().await?;
        info!(%api_addr, "API server started");

        tokio::signal::ctrl_c().await?;
        info!("Received shutdown signal");

        self.shutdown();
        Ok(())
    }

    /// Register both worker hosts on the runtime.
    pub async fn register_hosts(&self) {
        register_orders_host(
            &self.runtime,
            self.store.clone(),
            self.faults.clone(),
            &self.config.queues.orders,
            &self.config.worker,
        )
        .await;
        register_shipping_host(
            &self.runtime,
            self.store.clone(),
            self.faults.clone(),
            &self.config.queues.shipping,
            &self.config.worker,
        )
        .await;
    }

    /// Start the API server.
    pub async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let state = Arc::new(ApiState {
            runtime: self.runtime.clone(),
            orders_queue: self.config.queues.orders.clone(),
            shipping_queue: self.config.queues.shipping.clone(),
        });

        let router = create_router(state);
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DaemonError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| DaemonError::Config(format!("Failed to get local address: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "API server error");
            }
        });

        Ok(local_addr)
    }

    /// Graceful shutdown. Running workflows are abandoned; activities are
    /// idempotent, so a restarted order can be re-driven safely.
    fn shutdown(&self) {
        info!("Shutdown complete");
    }
}

// =============================================================================
// Tests
// =============================================================================
