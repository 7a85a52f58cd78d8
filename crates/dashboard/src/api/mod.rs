//! Backend API client.
//!
//! The backend verifies identity-provider credentials, keeps the login in a
//! session cookie, and answers customer searches from the sheet.
//!
//! Services depend on the [`SheetsApi`] and [`AuthApi`] traits rather than on
//! [`ApiClient`] directly, so tests can substitute fakes.

mod client;
mod cookies;
mod error;
pub mod types;

use std::future::Future;

use secrecy::SecretString;
use serde_json::Value;

pub use client::ApiClient;
pub use cookies::SessionCookies;
pub use error::{ApiError, ApiErrorResponse};
pub use types::{
    HealthResponse, LoginRequest, LoginResponse, LogoutResponse, ProfileResponse, SheetResponse,
};

/// Customer lookup in the backing sheet.
pub trait SheetsApi: Send + Sync {
    /// Fetch the raw rows matching `term`.
    ///
    /// A "nothing matched" reply yields an empty collection.
    fn search_customers(
        &self,
        term: &str,
    ) -> impl Future<Output = Result<Vec<Vec<Value>>, ApiError>> + Send;
}

/// Credential verification and backend session management.
pub trait AuthApi: Send + Sync {
    /// Post an identity-provider credential for verification.
    fn verify_credential(
        &self,
        credential: &SecretString,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// End the backend session.
    fn end_remote_session(&self) -> impl Future<Output = Result<LogoutResponse, ApiError>> + Send;
}
