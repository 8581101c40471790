//! Database lifecycle management.
//!
//! Provides migration running and status checking for the order tables.

use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Run all pending migrations.
///
/// Uses sqlx migrations from the workspace `migrations/` directory.
/// Idempotent: safe to run multiple times.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Check database connectivity and migration status.
pub async fn status(pool: &PgPool) -> Result<()> {
    let result: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if result != 1 {
        return Err(anyhow::anyhow!("Database connectivity check failed"));
    }

    info!("Database connectivity: OK");

    let rows = sqlx::query(
        r#"
        SELECT version, description, success
        FROM _sqlx_migrations
        ORDER BY version DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await;

    match rows {
        Ok(migrations) if !migrations.is_empty() => {
            info!("Latest migrations:");
            for migration in migrations {
                let version: i64 = migration.get("version");
                let description: String = migration.get("description");
                let success: Option<bool> = migration.get("success");

                let marker = if success.unwrap_or(true) { "ok" } else { "failed" };
                info!("  [{}] v{}: {}", marker, version, description);
            }
        }
        Ok(_) => {
            warn!("No migrations found in database (run `trellisd db migrate` first)");
        }
        Err(e) => {
            if e.to_string().contains("_sqlx_migrations") {
                warn!("Migration table not found (run `trellisd db migrate` first)");
            } else {
                return Err(e.into());
            }
        }
    }

    Ok(())
}
