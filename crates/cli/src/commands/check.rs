//! Database connectivity check.
//!
//! ```bash
//! od-cli check
//! ```

use super::{CommandError, connect};

/// Connect to the database and run a trivial query.
///
/// # Errors
///
/// Returns `CommandError` if the connection or query fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
    tracing::info!(result = one, "Database is reachable");

    pool.close().await;
    Ok(())
}
