//! Order Desk API library.
//!
//! This crate provides the order service as a library, allowing the router
//! to be driven in-process by tests and reused by other binaries.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
