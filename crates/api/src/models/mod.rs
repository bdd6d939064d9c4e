//! Domain models for the order API.

pub mod order;

pub use order::{
    CreateOrderRequest, NewOrder, NewOrderItem, Order, OrderItem, OrderItemRequest,
    OrderSearchParams,
};
