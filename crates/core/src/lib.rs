//! Order Desk Core - Shared domain types.
//!
//! This crate provides the types shared by the Order Desk components:
//! - `api` - Order management HTTP service
//! - `cli` - Command-line tools for migrations and checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, quantities, and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
