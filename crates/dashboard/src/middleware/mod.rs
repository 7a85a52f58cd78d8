//! Navigation middleware.
//!
//! - `guard` - route access gate consulted before entering a view

pub mod guard;

pub use guard::{GuardOutcome, RouteGuard};
