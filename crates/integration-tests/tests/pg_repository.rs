//! Integration tests for the `PostgreSQL` order repository.
//!
//! These tests require a migrated `PostgreSQL` database (`od-cli migrate`)
//! reachable through `ORDERDESK_DATABASE_URL`.
//!
//! Run with: cargo test -p orderdesk-integration-tests -- --ignored

use orderdesk_api::db::{OrderStore, PgOrderRepository, RepositoryError, create_pool};
use orderdesk_api::models::{
    CreateOrderRequest, NewOrder, NewOrderItem, OrderItemRequest, OrderSearchParams,
};
use orderdesk_api::services::{OrderError, OrderService};
use orderdesk_core::{OrderId, Pagination, Price, ProductId, Quantity};
use orderdesk_integration_tests::{database_url, unique_user_id};
use rust_decimal::Decimal;

async fn service() -> OrderService<PgOrderRepository> {
    let url = database_url().expect("ORDERDESK_DATABASE_URL must be set");
    let pool = create_pool(&url, 2)
        .await
        .expect("Failed to connect to database");
    OrderService::new(PgOrderRepository::new(pool))
}

fn line(product: i32, quantity: i32, price: &str) -> OrderItemRequest {
    OrderItemRequest {
        product_id: ProductId::new(product),
        quantity,
        price: price.parse().expect("valid decimal"),
    }
}

async fn count_for(service: &OrderService<PgOrderRepository>, user_id: &str) -> i64 {
    let search = OrderSearchParams::from_keyword(Some(user_id.to_string()));
    let (_, count) = service
        .get_all_orders(&search, &Pagination::default())
        .await
        .expect("Failed to list orders");
    count
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_create_order_persists_items_atomically() {
    let service = service().await;
    let user_id = unique_user_id("pg-create");

    let order = service
        .create_order(CreateOrderRequest {
            user_id: Some(user_id.clone()),
            order_items: vec![line(7, 2, "10.0"), line(9, 1, "5.5")],
        })
        .await
        .expect("Failed to create order");

    assert_eq!(order.total_amount, Decimal::new(255, 1));

    let stored = service
        .get_order_by_id(order.id)
        .await
        .expect("Failed to fetch order");
    assert_eq!(stored.order_items.len(), 2);
    assert!(stored.order_items.iter().all(|i| i.order_id == order.id));
    assert_eq!(count_for(&service, &user_id).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_item_failure_rolls_back_order_row() {
    let service = service().await;
    let store = service.store();
    let user_id = unique_user_id("pg-rollback");

    let mut tx = store.begin().await.expect("Failed to begin transaction");
    let order = store
        .create_in(
            &mut tx,
            &NewOrder {
                user_id: Some(user_id.clone()),
                total_amount: Decimal::new(100, 2),
            },
        )
        .await
        .expect("Failed to insert order row");

    // Item points at an order that does not exist
    let err = store
        .create_item_in(
            &mut tx,
            &NewOrderItem {
                order_id: OrderId::new(i32::MAX),
                product_id: ProductId::new(1),
                quantity: Quantity::new(1).expect("valid quantity"),
                price: Price::new(Decimal::new(100, 2)).expect("valid price"),
            },
        )
        .await
        .expect_err("foreign key violation");
    assert!(matches!(err, RepositoryError::InvalidReference(_)));
    assert!(err.is_client_fault());

    store.rollback(tx).await.expect("Failed to roll back");

    assert!(matches!(
        service.get_order_by_id(order.id).await,
        Err(OrderError::NotFound(_))
    ));
    assert_eq!(count_for(&service, &user_id).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_oversized_price_rejected_before_storage() {
    let service = service().await;
    let user_id = unique_user_id("pg-oversized");

    let err = service
        .create_order(CreateOrderRequest {
            user_id: Some(user_id.clone()),
            order_items: vec![line(1, 1, "1.00"), line(2, 1, "100000000000.00")],
        })
        .await
        .expect_err("price exceeds the item column");

    assert!(matches!(err, OrderError::Validation(ref m) if m.starts_with("order_items[1]")));
    assert_eq!(count_for(&service, &user_id).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_stored_total_equals_sum_of_stored_lines() {
    let service = service().await;
    let user_id = unique_user_id("pg-total");

    let order = service
        .create_order(CreateOrderRequest {
            user_id: Some(user_id),
            order_items: vec![line(1, 3, "0.01"), line(2, 7, "19.99"), line(3, 1, "10.500")],
        })
        .await
        .expect("Failed to create order");

    let stored = service
        .get_order_by_id(order.id)
        .await
        .expect("Failed to fetch order");

    let sum = stored
        .order_items
        .iter()
        .map(|item| item.subtotal().expect("line fits"))
        .sum::<Decimal>();
    assert_eq!(stored.total_amount, Decimal::new(15046, 2));
    assert_eq!(stored.total_amount, sum);
    assert_eq!(stored.total_amount, order.total_amount);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_unknown_id_is_not_found() {
    let service = service().await;
    let err = service
        .get_order_by_id(OrderId::new(i32::MAX))
        .await
        .expect_err("no such order");
    assert!(matches!(err, OrderError::NotFound(_)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_ping() {
    let service = service().await;
    service.store().ping().await.expect("database reachable");
}
