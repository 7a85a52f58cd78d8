//! Dashboard models.

pub mod session;

pub use session::{ProfileDisplay, keys as session_keys};
