//! Order service.
//!
//! Validates incoming orders, derives their totals, and writes the order and
//! all of its items as one transaction.

use thiserror::Error;
use tracing::instrument;

use orderdesk_core::{AmountError, OrderId, Pagination, Price, Quantity, order_total};

use crate::db::{OrderStore, RepositoryError};
use crate::models::{
    CreateOrderRequest, NewOrder, NewOrderItem, Order, OrderItemRequest, OrderSearchParams,
};

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request is malformed or semantically invalid.
    #[error("invalid order: {0}")]
    Validation(String),

    /// No order has the requested ID.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// Storage failed; the request's writes were rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// A line that passed validation.
struct ValidLine {
    item: OrderItemRequest,
    quantity: Quantity,
    price: Price,
}

/// Order service.
pub struct OrderService<S> {
    store: S,
}

impl<S: OrderStore> OrderService<S> {
    /// Create a new order service over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// List one page of orders with the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Storage` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_all_orders(
        &self,
        search: &OrderSearchParams,
        pagination: &Pagination,
    ) -> Result<(Vec<Order>, i64), OrderError> {
        Ok(self.store.get_all(search, pagination).await?)
    }

    /// Get a single order with its items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if no order has this ID.
    /// Returns `OrderError::Storage` for other storage failures.
    #[instrument(skip(self))]
    pub async fn get_order_by_id(&self, id: OrderId) -> Result<Order, OrderError> {
        self.store.get_by_id(id).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::NotFound(id),
            other => OrderError::Storage(other),
        })
    }

    /// Create an order and its items atomically.
    ///
    /// The total is computed from the lines; any client-supplied total is
    /// never consulted. Validation runs before any storage call. If any insert
    /// fails, the transaction is rolled back and no row from this request is
    /// visible afterwards.
    ///
    /// Returns the persisted order without its items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` if there are no lines, a line has a
    /// non-positive quantity or a price that is negative, has sub-cent
    /// digits, or is too large, or the total exceeds `MAX_ORDER_TOTAL`.
    /// Returns `OrderError::Storage` if any write or the commit fails.
    #[instrument(skip(self, request), fields(items = request.order_items.len()))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let lines = validate_lines(request.order_items)?;
        let total_amount = order_total(lines.iter().map(|l| (l.price, l.quantity)))
            .map_err(|e| OrderError::Validation(format!("order total: {e}")))?;

        let new_order = NewOrder {
            user_id: request.user_id,
            total_amount,
        };

        let mut tx = self.store.begin().await?;
        match self.write_order(&mut tx, &new_order, &lines).await {
            Ok(order) => {
                self.store.commit(tx).await?;
                tracing::info!(
                    order_id = %order.id,
                    items = lines.len(),
                    total = %order.total_amount,
                    "Order created"
                );
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order write failed, rolling back");
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(e.into())
            }
        }
    }

    /// Insert the order row, then each item against its new ID, all in `tx`.
    async fn write_order(
        &self,
        tx: &mut S::Tx,
        new_order: &NewOrder,
        lines: &[ValidLine],
    ) -> Result<Order, RepositoryError> {
        let mut orders = self.store.with_transaction(tx);
        let order = orders.create(new_order).await?;

        for line in lines {
            orders
                .create_item(&NewOrderItem {
                    order_id: order.id,
                    product_id: line.item.product_id,
                    quantity: line.quantity,
                    price: line.price,
                })
                .await?;
        }

        Ok(order)
    }
}

/// Check that there is at least one line and every line is well-formed.
fn validate_lines(items: Vec<OrderItemRequest>) -> Result<Vec<ValidLine>, OrderError> {
    if items.is_empty() {
        return Err(OrderError::Validation("no order items supplied".to_owned()));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let line_error =
                |e: AmountError| OrderError::Validation(format!("order_items[{index}]: {e}"));
            let quantity = Quantity::new(item.quantity).map_err(line_error)?;
            let price = Price::new(item.price).map_err(line_error)?;
            Ok(ValidLine {
                item,
                quantity,
                price,
            })
        })
        .collect()
}
