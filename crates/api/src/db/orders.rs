//! `PostgreSQL` order repository.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds
//! without a live database or an offline query cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use orderdesk_core::{OrderId, OrderItemId, Pagination, Price, ProductId, Quantity};

use super::{OrderStore, RepositoryError};
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem, OrderSearchParams};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: Option<String>,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: row.user_id,
            order_items: Vec::new(),
            total_amount: row.total_amount,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity in database: {e}"))
        })?;
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity,
            price,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the items of every order in `orders` with one query and attach them.
    async fn attach_items(&self, orders: &mut [Order]) -> Result<(), RepositoryError> {
        if orders.is_empty() {
            return Ok(());
        }

        let ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, price
            FROM orderdesk.order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let item = OrderItem::try_from(row)?;
            if let Some(order) = orders.iter_mut().find(|o| o.id == item.order_id) {
                order.order_items.push(item);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderRepository {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), RepositoryError> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), RepositoryError> {
        Ok(tx.rollback().await?)
    }

    /// List orders, newest first.
    ///
    /// The keyword matches, case-insensitively and as a substring, either the
    /// order ID or the buyer's user ID.
    async fn get_all(
        &self,
        search: &OrderSearchParams,
        pagination: &Pagination,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let pattern = search.keyword.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total_amount, created_at
            FROM orderdesk.orders
            WHERE
                $1::text IS NULL
                OR CAST(id AS TEXT) ILIKE $1
                OR user_id ILIKE $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(pattern.as_deref())
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM orderdesk.orders
            WHERE
                $1::text IS NULL
                OR CAST(id AS TEXT) ILIKE $1
                OR user_id ILIKE $1
            ",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let mut orders: Vec<Order> = rows.into_iter().map(Into::into).collect();
        self.attach_items(&mut orders).await?;

        Ok((orders, count))
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total_amount, created_at
            FROM orderdesk.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut orders = [Order::from(row)];
        self.attach_items(&mut orders).await?;
        let [order] = orders;

        Ok(order)
    }

    async fn create_in(
        &self,
        tx: &mut Self::Tx,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orderdesk.orders (user_id, total_amount)
            VALUES ($1, $2)
            RETURNING id, user_id, total_amount, created_at
            ",
        )
        .bind(order.user_id.as_deref())
        .bind(order.total_amount)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn create_item_in(
        &self,
        tx: &mut Self::Tx,
        item: &NewOrderItem,
    ) -> Result<OrderItem, RepositoryError> {
        let row = sqlx::query_as::<_, OrderItemRow>(
            r"
            INSERT INTO orderdesk.order_items (order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, product_id, quantity, price
            ",
        )
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.quantity.get())
        .bind(item.price.amount())
        .fetch_one(&mut **tx)
        .await
        .map_err(map_write_error)?;

        OrderItem::try_from(row)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Classify constraint violations on insert.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
            return RepositoryError::OutOfRange(db_err.message().to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::InvalidReference(db_err.message().to_owned());
        }
        if db_err.is_unique_violation() || db_err.is_check_violation() {
            return RepositoryError::Conflict(db_err.message().to_owned());
        }
    }
    RepositoryError::Database(e)
}

/// Build an `ILIKE` substring pattern, escaping the keyword's own wildcards.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_keyword() {
        assert_eq!(like_pattern("42"), "%42%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        assert!(matches!(
            map_write_error(sqlx::Error::PoolTimedOut),
            RepositoryError::Database(sqlx::Error::PoolTimedOut)
        ));
    }

    #[test]
    fn test_item_row_rejects_corrupt_quantity() {
        let row = OrderItemRow {
            id: 1,
            order_id: 1,
            product_id: 7,
            quantity: 0,
            price: Decimal::ONE,
        };
        assert!(matches!(
            OrderItem::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_order_row_conversion() {
        let now = Utc::now();
        let order = Order::from(OrderRow {
            id: 5,
            user_id: Some("uid-1".to_owned()),
            total_amount: Decimal::new(255, 1),
            created_at: now,
        });
        assert_eq!(order.id, OrderId::new(5));
        assert!(order.order_items.is_empty());
        assert_eq!(order.created_at, now);
    }
}
