//! In-process order store.
//!
//! Writes are staged in a [`MemoryTx`] and only become visible to readers on
//! commit, so the store has the same atomicity as the database. IDs come
//! from shared counters that are never rolled back, like `SERIAL` sequences.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use orderdesk_core::{OrderId, OrderItemId, Pagination, ProductId};

use super::{OrderStore, RepositoryError};
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem, OrderSearchParams};

/// Order store held entirely in memory.
///
/// Cheaply cloneable; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    state: Arc<Mutex<MemoryState>>,
    catalog: Option<Arc<HashSet<ProductId>>>,
}

#[derive(Default)]
struct MemoryState {
    last_order_id: i32,
    last_item_id: i32,
    orders: Vec<Order>,
    items: Vec<OrderItem>,
}

impl MemoryState {
    fn next_order_id(&mut self) -> OrderId {
        self.last_order_id += 1;
        OrderId::new(self.last_order_id)
    }

    fn next_item_id(&mut self) -> OrderItemId {
        self.last_item_id += 1;
        OrderItemId::new(self.last_item_id)
    }

    fn with_items(&self, mut order: Order) -> Order {
        order.order_items = self
            .items
            .iter()
            .filter(|item| item.order_id == order.id)
            .cloned()
            .collect();
        order
    }
}

/// Writes staged by one open transaction.
#[derive(Debug, Default)]
pub struct MemoryTx {
    orders: Vec<Order>,
    items: Vec<OrderItem>,
}

impl MemoryOrderStore {
    /// Create an empty store that accepts any product ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that only accepts items for `products`.
    ///
    /// Items for any other product fail with
    /// `RepositoryError::InvalidReference`, as a foreign key would.
    #[must_use]
    pub fn with_catalog(products: impl IntoIterator<Item = ProductId>) -> Self {
        Self {
            state: Arc::default(),
            catalog: Some(Arc::new(products.into_iter().collect())),
        }
    }

    /// Number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Number of committed order items.
    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        Ok(MemoryTx::default())
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.orders.extend(tx.orders);
        state.items.extend(tx.items);
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), RepositoryError> {
        drop(tx);
        Ok(())
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
        let state = self.state.lock().await;
        let keyword = search.keyword.as_deref().map(str::to_lowercase);

        let mut matching: Vec<&Order> = state
            .orders
            .iter()
            .filter(|order| {
                keyword.as_deref().is_none_or(|kw| {
                    order.id.to_string().contains(kw)
                        || order
                            .user_id
                            .as_deref()
                            .is_some_and(|uid| uid.to_lowercase().contains(kw))
                })
            })
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });

        let count = i64::try_from(matching.len())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(pagination.limit()).unwrap_or(usize::MAX);

        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|order| state.with_items(order.clone()))
            .collect();

        Ok((page, count))
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let state = self.state.lock().await;
        let order = state
            .orders
            .iter()
            .find(|order| order.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        Ok(state.with_items(order))
    }

    async fn create_in(
        &self,
        tx: &mut Self::Tx,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let id = self.state.lock().await.next_order_id();
        let created = Order {
            id,
            user_id: order.user_id.clone(),
            order_items: Vec::new(),
            total_amount: order.total_amount,
            created_at: Utc::now(),
        };
        tx.orders.push(created.clone());
        Ok(created)
    }

    async fn create_item_in(
        &self,
        tx: &mut Self::Tx,
        item: &NewOrderItem,
    ) -> Result<OrderItem, RepositoryError> {
        let mut state = self.state.lock().await;

        let order_exists = tx.orders.iter().any(|o| o.id == item.order_id)
            || state.orders.iter().any(|o| o.id == item.order_id);
        if !order_exists {
            return Err(RepositoryError::InvalidReference(format!(
                "order {} does not exist",
                item.order_id
            )));
        }

        if let Some(catalog) = &self.catalog
            && !catalog.contains(&item.product_id)
        {
            return Err(RepositoryError::InvalidReference(format!(
                "product {} does not exist",
                item.product_id
            )));
        }

        let created = OrderItem {
            id: state.next_item_id(),
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        };
        tx.items.push(created.clone());
        Ok(created)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use orderdesk_core::{Price, Quantity};

    use super::*;

    fn new_order(user: &str) -> NewOrder {
        NewOrder {
            user_id: Some(user.to_owned()),
            total_amount: Decimal::TEN,
        }
    }

    fn new_item(order_id: OrderId, product: i32) -> NewOrderItem {
        NewOrderItem {
            order_id,
            product_id: ProductId::new(product),
            quantity: Quantity::new(1).unwrap(),
            price: Price::new(Decimal::TEN).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let store = MemoryOrderStore::new();
        let mut tx = store.begin().await.unwrap();

        let order = store.create_in(&mut tx, &new_order("alice")).await.unwrap();
        store
            .create_item_in(&mut tx, &new_item(order.id, 7))
            .await
            .unwrap();

        assert_eq!(store.order_count().await, 0);
        assert!(matches!(
            store.get_by_id(order.id).await,
            Err(RepositoryError::NotFound)
        ));

        store.commit(tx).await.unwrap();

        let fetched = store.get_by_id(order.id).await.unwrap();
        assert_eq!(fetched.order_items.len(), 1);
        assert_eq!(store.item_count().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryOrderStore::new();
        let mut tx = store.begin().await.unwrap();
        let order = store.create_in(&mut tx, &new_order("bob")).await.unwrap();
        store
            .create_item_in(&mut tx, &new_item(order.id, 7))
            .await
            .unwrap();

        store.rollback(tx).await.unwrap();

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn test_item_requires_existing_order() {
        let store = MemoryOrderStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = store
            .create_item_in(&mut tx, &new_item(OrderId::new(99), 7))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_catalog_rejects_unknown_product() {
        let store = MemoryOrderStore::with_catalog([ProductId::new(7)]);
        let mut tx = store.begin().await.unwrap();
        let order = store.create_in(&mut tx, &new_order("carol")).await.unwrap();

        assert!(store.create_item_in(&mut tx, &new_item(order.id, 7)).await.is_ok());
        let err = store
            .create_item_in(&mut tx, &new_item(order.id, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_rollback() {
        let store = MemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        let first = store.create_in(&mut tx, &new_order("a")).await.unwrap();
        store.rollback(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let second = store.create_in(&mut tx, &new_order("b")).await.unwrap();
        store.commit(tx).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_get_all_filters_and_paginates() {
        let store = MemoryOrderStore::new();
        for user in ["alice", "ALICE-2", "bob"] {
            let mut tx = store.begin().await.unwrap();
            store.create_in(&mut tx, &new_order(user)).await.unwrap();
            store.commit(tx).await.unwrap();
        }

        let search = OrderSearchParams::from_keyword(Some("alice".into()));
        let (orders, count) = store
            .get_all(&search, &Pagination::new(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(orders.len(), 1);

        let (orders, count) = store
            .get_all(&OrderSearchParams::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(orders.len(), 3);

        let (orders, count) = store
            .get_all(&OrderSearchParams::default(), &Pagination::new(Some(5), None))
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert!(orders.is_empty());
    }
}
