//! Order domain types.
//!
//! These types represent validated domain objects separate from database row
//! types and from the raw request payload.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{AmountError, OrderId, OrderItemId, Price, ProductId, Quantity};

/// A persisted purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Storage-assigned order ID.
    pub id: OrderId,
    /// External identity-provider user ID of the buyer, if known.
    pub user_id: Option<String>,
    /// Line items, in insertion order.
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    /// Sum of `price × quantity` over the line items at creation time.
    pub total_amount: Decimal,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// A single product line belonging to exactly one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Storage-assigned item ID.
    pub id: OrderItemId,
    /// Parent order.
    pub order_id: OrderId,
    /// Catalog product this line refers to.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: Quantity,
    /// Unit price snapshotted at order time.
    pub price: Price,
}

impl OrderItem {
    /// Line subtotal (`price × quantity`).
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Overflow` if the product exceeds the decimal range.
    pub fn subtotal(&self) -> Result<Decimal, AmountError> {
        self.price.line_total(self.quantity)
    }
}

/// Insert payload for an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<String>,
    pub total_amount: Decimal,
}

/// Insert payload for an order item row.
///
/// `order_id` must reference an order already written in the same transaction
/// (or committed earlier).
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Price,
}

/// Filters for listing orders.
#[derive(Debug, Clone, Default)]
pub struct OrderSearchParams {
    /// Free-text keyword; `None` or blank means no filtering.
    pub keyword: Option<String>,
}

impl OrderSearchParams {
    /// Build search params from a raw query value, dropping blank keywords.
    #[must_use]
    pub fn from_keyword(keyword: Option<String>) -> Self {
        Self {
            keyword: keyword
                .map(|k| k.trim().to_owned())
                .filter(|k| !k.is_empty()),
        }
    }
}

/// Order creation request as sent by the client.
///
/// Unknown fields (including any client-computed `total_amount`) are ignored;
/// the total is always derived from the line items.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    /// Buyer's external user ID.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Requested lines. Must not be empty.
    #[serde(default)]
    pub order_items: Vec<OrderItemRequest>,
}

/// One requested order line, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
}
