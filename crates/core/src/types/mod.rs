//! Core types for Order Desk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod pagination;
pub mod price;
pub mod quantity;

pub use id::*;
pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Pagination};
pub use price::{AMOUNT_SCALE, AmountError, MAX_ORDER_TOTAL, MAX_PRICE, Price, order_total};
pub use quantity::Quantity;
