//! Little Sun Core - Shared types library.
//!
//! This crate provides the domain types used across the Little Sun components:
//! - `dashboard` - Session state, route gate, search and table view services
//! - `cli` - Terminal front-end driving the dashboard
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and lets the table
//! pipeline be tested without any runtime.
//!
//! # Modules
//!
//! - [`types`] - Customer records, sort/page specifications, routes, users
//! - [`table`] - The sort + paginate pipeline producing visible rows

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod table;
pub mod types;

pub use table::visible_rows;
pub use types::*;
