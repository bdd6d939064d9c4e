//! Integration tests for Order Desk.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and start the API
//! cargo run -p orderdesk-cli -- migrate
//! cargo run -p orderdesk-api
//!
//! # Run the ignored integration tests
//! cargo test -p orderdesk-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `orders_api` - HTTP tests against a running `orderdesk-api`
//! - `pg_repository` - Service and repository tests against `PostgreSQL`
//!
//! # Environment Variables
//!
//! - `ORDERDESK_BASE_URL` - API base URL (default: `http://localhost:8080`)
//! - `ORDERDESK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use secrecy::SecretString;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the order API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("ORDERDESK_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Database URL for repository tests, if one is configured.
#[must_use]
pub fn database_url() -> Option<SecretString> {
    std::env::var("ORDERDESK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// A user ID no other test run will share, so keyword searches only see
/// this test's orders.
#[must_use]
pub fn unique_user_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// The two-line example order (`2 × 10.0 + 1 × 5.5`).
#[must_use]
pub fn example_order(user_id: &str) -> Value {
    json!({
        "user_id": user_id,
        "order_items": [
            {"product_id": 7, "quantity": 2, "price": 10.0},
            {"product_id": 9, "quantity": 1, "price": 5.5}
        ]
    })
}
