//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! od-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ORDERDESK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/api/migrations/` and are embedded at build time:
//! ```text
//! migrations/
//! └── 20260101000001_create_orders.sql
//! ```

use super::{CommandError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running order migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Order migrations complete!");
    Ok(())
}
