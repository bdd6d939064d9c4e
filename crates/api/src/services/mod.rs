//! Business logic services for the order API.
//!
//! # Services
//!
//! - `orders` - Order validation, total derivation, and transactional creation

pub mod orders;

pub use orders::{OrderError, OrderService};
