//! Order routes.
//!
//! JSON endpoints for listing, creating, and fetching orders. Every failure
//! goes through [`AppError`] and is rendered as `{"error": "..."}`.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orderdesk_core::{OrderId, Pagination};

use super::{AppJson, AppPath, AppQuery};
use crate::db::OrderStore;
use crate::error::{AppError, Result};
use crate::models::{CreateOrderRequest, Order, OrderSearchParams};
use crate::state::AppState;

/// Query string accepted by `GET /orders`.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub keyword: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "pageSize", alias = "page_size")]
    pub page_size: Option<u32>,
}

/// One page of orders plus the total number of matches.
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub data: Vec<Order>,
    pub count: i64,
}

/// A single order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub data: Order,
}

/// Acknowledgement for a write.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// List orders.
///
/// GET /orders?keyword=&page=&pageSize=
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a malformed query string and
/// `AppError::ListFailed` if the store fails.
#[instrument(skip(state))]
pub async fn index<S: OrderStore>(
    State(state): State<AppState<S>>,
    AppQuery(query): AppQuery<ListOrdersQuery>,
) -> Result<Json<OrderListResponse>> {
    let search = OrderSearchParams::from_keyword(query.keyword);
    let pagination = Pagination::new(query.page, query.page_size);

    let (data, count) = state
        .orders()
        .get_all_orders(&search, &pagination)
        .await
        .map_err(AppError::from_list_error)?;

    Ok(Json(OrderListResponse { data, count }))
}

/// Create an order and its items.
///
/// POST /orders
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the body is not valid JSON, fails
/// validation, or references rows that do not exist. Returns
/// `AppError::Database` for any other storage failure.
#[instrument(skip(state, request))]
pub async fn create<S: OrderStore>(
    State(state): State<AppState<S>>,
    AppJson(request): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    state.orders().create_order(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Order created successfully".to_string(),
        }),
    ))
}

/// Fetch one order with its items.
///
/// GET /orders/{id}
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the ID is not numeric or no order has
/// it, and `AppError::Database` if the store fails.
#[instrument(skip(state))]
pub async fn show<S: OrderStore>(
    State(state): State<AppState<S>>,
    AppPath(id): AppPath<String>,
) -> Result<Json<OrderResponse>> {
    let id: OrderId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Failed to retrieve id param".to_string()))?;

    let order = state.orders().get_order_by_id(id).await?;

    Ok(Json(OrderResponse { data: order }))
}
