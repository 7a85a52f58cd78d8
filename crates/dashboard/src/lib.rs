//! Little Sun dashboard library.
//!
//! Session handling, route gating, customer search and the customer table
//! for the Little Sun admin dashboard, independent of any particular front
//! end.
//!
//! # Components
//!
//! - [`services::SessionStore`] - login state, persisted through a
//!   [`storage::KeyValueStore`]
//! - [`middleware::RouteGuard`] - route access gate
//! - [`services::SearchDispatcher`] - customer search against the backend
//! - [`components::TableView`] - sorted, paginated visible rows
//! - [`components::ProfileAdapter`] - login/logout display surface
//!
//! [`Dashboard`] wires them together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod services;
pub mod signal;
pub mod state;
pub mod storage;

pub use config::DashboardConfig;
pub use error::{DashboardError, ErrorKind};
pub use state::Dashboard;
