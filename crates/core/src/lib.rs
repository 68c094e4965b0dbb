//! Bramble Core - Shared types library.
//!
//! This crate provides the domain types used across all Bramble components:
//! - `cart` - Client-side cart engine (local state + remote sync)
//! - `cli` - Command-line tools for poking at a cart against a live service
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, minor-unit prices, product snapshots, and cart
//!   line items with their money math and boundary validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
