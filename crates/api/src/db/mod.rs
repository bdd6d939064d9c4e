//! Database operations for the order API.
//!
//! # Database: `orderdesk`
//!
//! ## Tables
//!
//! - `orders` - One row per purchase order, with its derived total
//! - `order_items` - Line items, each referencing exactly one order
//!
//! Product, category, and brand data belong to the catalog service; order
//! items only carry the product ID and a price snapshot.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p orderdesk-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Storage is reached through the [`OrderStore`] trait so the service layer
//! is independent of the backend:
//!
//! - [`PgOrderRepository`] - `PostgreSQL` via `sqlx`
//! - [`MemoryOrderStore`] - in-process store for tests and local runs

pub mod memory;
pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use orderdesk_core::{OrderId, Pagination};

use crate::models::{NewOrder, NewOrderItem, Order, OrderItem, OrderSearchParams};

pub use memory::{MemoryOrderStore, MemoryTx};
pub use orders::PgOrderRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique or check constraint).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row does not exist (foreign-key violation).
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A value does not fit its column (numeric field overflow).
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

impl RepositoryError {
    /// Whether the failure was caused by the data the client sent rather than
    /// by the storage backend.
    #[must_use]
    pub const fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::InvalidReference(_) | Self::OutOfRange(_)
        )
    }
}

/// Storage for orders and their line items.
///
/// Writes go through a transaction handle (`Tx`) so the service can make an
/// order and all of its items one atomic unit. Reads run outside any
/// transaction and only ever see committed rows.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Transaction handle threaded through write calls.
    type Tx: Send;

    /// Open a new transaction.
    async fn begin(&self) -> Result<Self::Tx, RepositoryError>;

    /// Commit every write made through `tx`.
    async fn commit(&self, tx: Self::Tx) -> Result<(), RepositoryError>;

    /// Discard every write made through `tx`.
    async fn rollback(&self, tx: Self::Tx) -> Result<(), RepositoryError>;

    /// List one page of orders matching `search`, with the total match count.
    async fn get_all(
        &self,
        search: &OrderSearchParams,
        pagination: &Pagination,
    ) -> Result<(Vec<Order>, i64), RepositoryError>;

    /// Get one order with its items.
    ///
    /// Returns `RepositoryError::NotFound` when no order has this ID.
    async fn get_by_id(&self, id: OrderId) -> Result<Order, RepositoryError>;

    /// Insert an order row inside `tx`, returning it with its assigned ID.
    async fn create_in(&self, tx: &mut Self::Tx, order: &NewOrder)
    -> Result<Order, RepositoryError>;

    /// Insert an order item row inside `tx`.
    async fn create_item_in(
        &self,
        tx: &mut Self::Tx,
        item: &NewOrderItem,
    ) -> Result<OrderItem, RepositoryError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Bind this store to `tx` so subsequent writes join that transaction.
    fn with_transaction<'t>(&'t self, tx: &'t mut Self::Tx) -> TxOrders<'t, Self>
    where
        Self: Sized,
    {
        TxOrders { store: self, tx }
    }
}

/// An [`OrderStore`] bound to one open transaction.
pub struct TxOrders<'t, S: OrderStore> {
    store: &'t S,
    tx: &'t mut S::Tx,
}

impl<S: OrderStore> TxOrders<'_, S> {
    /// Insert an order row in the bound transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    pub async fn create(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        self.store.create_in(&mut *self.tx, order).await
    }

    /// Insert an order item row in the bound transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the parent order does not
    /// exist, or another `RepositoryError` if the insert fails.
    pub async fn create_item(&mut self, item: &NewOrderItem) -> Result<OrderItem, RepositoryError> {
        self.store.create_item_in(&mut *self.tx, item).await
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections.min(2))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
