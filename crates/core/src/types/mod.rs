//! Core types for Little Sun.
//!
//! This module provides type-safe wrappers for the dashboard's domain concepts.

pub mod email;
pub mod record;
pub mod route;
pub mod user;
pub mod view;

pub use email::{Email, EmailError};
pub use record::{CustomerRecord, ParseSortColumnError, SortColumn, coerce_amount, coerce_text};
pub use route::Route;
pub use user::{UserInfo, parse_expiry};
pub use view::{PageSpec, PageSpecError, ParseSortDirectionError, SortDirection, SortSpec};
