//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use trellis_workflows::{ORDERS_TASK_QUEUE, SHIPPING_TASK_QUEUE};

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Task-queue names
    pub queues: QueueConfig,

    /// Database configuration
    pub db: DbConfig,

    /// Worker host concurrency tuning
    pub worker: WorkerTuning,

    /// Environment (test, development, production)
    pub environment: Environment,

    /// Enable the random fault injector in activity bodies
    pub fault_injection: bool,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Task-queue names, overridable per environment.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub orders: String,
    pub shipping: String,
}

/// Database configuration. `url` is `None` when no database is
/// configured; the daemon then falls back to the in-memory store.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: Option<String>,
}

/// Per-host concurrency limits.
#[derive(Debug, Clone)]
pub struct WorkerTuning {
    pub max_concurrent_activities: usize,
    pub max_concurrent_workflow_tasks: usize,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (in-memory store, no fault injection)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let api = Self::load_api_config()?;
        let queues = Self::load_queue_config();
        let db = Self::load_db_config();
        let worker = Self::load_worker_tuning()?;
        let fault_injection = matches!(
            env::var("TRELLIS_FAULT_INJECTION").ok().as_deref(),
            Some("1") | Some("true")
        );

        Ok(Self {
            api,
            queues,
            db,
            worker,
            environment,
            fault_injection,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            queues: QueueConfig {
                orders: ORDERS_TASK_QUEUE.to_string(),
                shipping: SHIPPING_TASK_QUEUE.to_string(),
            },
            db: DbConfig { url: None },
            worker: WorkerTuning {
                max_concurrent_activities: 50,
                max_concurrent_workflow_tasks: 20,
            },
            environment: Environment::Test,
            fault_injection: false,
        }
    }

    fn load_environment() -> DaemonResult<Environment> {
        let env_str = env::var("TRELLIS_ENV").unwrap_or_else(|_| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid TRELLIS_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config() -> DaemonResult<ApiConfig> {
        let host = env::var("TRELLIS_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_str = env::var("TRELLIS_API_PORT").unwrap_or_else(|_| "8080".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| DaemonError::Config(format!("Invalid TRELLIS_API_PORT: {}", port_str)))?;

        Ok(ApiConfig { host, port })
    }

    fn load_queue_config() -> QueueConfig {
        QueueConfig {
            orders: env::var("TRELLIS_ORDERS_TQ")
                .unwrap_or_else(|_| ORDERS_TASK_QUEUE.to_string()),
            shipping: env::var("TRELLIS_SHIPPING_TQ")
                .unwrap_or_else(|_| SHIPPING_TASK_QUEUE.to_string()),
        }
    }

    /// `DATABASE_URL` wins; otherwise the URL is composed from the
    /// `TRELLIS_DB_*` parts when a host is configured.
    fn load_db_config() -> DbConfig {
        if let Ok(url) = env::var("DATABASE_URL") {
            return DbConfig { url: Some(url) };
        }

        let Ok(host) = env::var("TRELLIS_DB_HOST") else {
            return DbConfig { url: None };
        };
        let port = env::var("TRELLIS_DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let user = env::var("TRELLIS_DB_USER").unwrap_or_else(|_| "trellis".to_string());
        let password = env::var("TRELLIS_DB_PASSWORD").unwrap_or_else(|_| "trellis".to_string());
        let name = env::var("TRELLIS_DB_NAME").unwrap_or_else(|_| "trellis".to_string());

        DbConfig {
            url: Some(format!("postgres://{user}:{password}@{host}:{port}/{name}")),
        }
    }

    fn load_worker_tuning() -> DaemonResult<WorkerTuning> {
        let activities = Self::load_usize_env("TRELLIS_MAX_CONCURRENT_ACTIVITIES", 50)?;
        let workflow_tasks = Self::load_usize_env("TRELLIS_MAX_CONCURRENT_WORKFLOW_TASKS", 20)?;

        Ok(WorkerTuning {
            max_concurrent_activities: activities,
            max_concurrent_workflow_tasks: workflow_tasks,
        })
    }

    fn load_usize_env(key: &str, default: usize) -> DaemonResult<usize> {
        match env::var(key) {
            Ok(val) => val
                .parse::<usize>()
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            queues: QueueConfig {
                orders: ORDERS_TASK_QUEUE.to_string(),
                shipping: SHIPPING_TASK_QUEUE.to_string(),
            },
            db: DbConfig { url: None },
            worker: WorkerTuning {
                max_concurrent_activities: 50,
                max_concurrent_workflow_tasks: 20,
            },
            environment: Environment::Development,
            fault_injection: false,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
