//! Unified error handling for the dashboard.
//!
//! Every failure resolves to a visible, recoverable state. [`ErrorKind`]
//! decides how a failure is logged and whether it is reported to Sentry.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::services::{EMPTY_TERM_MESSAGE, LoginError, SearchError};
use crate::storage::StorageError;

/// Dashboard-level error type.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A backend request failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// A search failed.
    #[error("{0}")]
    Search(#[from] SearchError),

    /// A login attempt failed.
    #[error("{0}")]
    Login(#[from] LoginError),

    /// The session expired and was cleared.
    #[error("session expired")]
    SessionExpired,
}

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input, reported inline.
    Validation,
    /// A backend request failed.
    Network,
    /// The backend refused the user.
    AuthDenied,
    /// The local session ran out.
    SessionExpired,
    /// Durable storage failed.
    Storage,
    /// No credential could be obtained from the identity provider.
    Identity,
    /// Configuration is invalid.
    Config,
}

impl DashboardError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Storage(_) | Self::Login(LoginError::Storage(_)) => ErrorKind::Storage,
            Self::Api(e) | Self::Search(SearchError::Api(e)) if e.is_unauthorized() => {
                ErrorKind::AuthDenied
            }
            Self::Api(_) | Self::Search(SearchError::Api(_)) | Self::Login(LoginError::Network(_)) => {
                ErrorKind::Network
            }
            Self::Search(SearchError::EmptyTerm) => ErrorKind::Validation,
            Self::Login(LoginError::AuthDenied { .. }) => ErrorKind::AuthDenied,
            Self::Login(LoginError::Identity(_)) => ErrorKind::Identity,
            Self::SessionExpired => ErrorKind::SessionExpired,
        }
    }

    /// Whether this error is a fault worth reporting, as opposed to an
    /// expected outcome of user action.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Network | ErrorKind::Storage | ErrorKind::Config
        )
    }

    /// Text shown inline to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation => EMPTY_TERM_MESSAGE.to_string(),
            ErrorKind::SessionExpired => "Session expired, please log in again".to_string(),
            _ => format!("Error: {self}"),
        }
    }

    /// Log this error at the level its kind calls for, capturing faults to
    /// Sentry.
    pub fn report(&self) {
        match self.kind() {
            ErrorKind::Validation => tracing::debug!(error = %self, "Validation failed"),
            ErrorKind::SessionExpired => tracing::info!("Session expired"),
            ErrorKind::AuthDenied | ErrorKind::Identity => {
                tracing::warn!(error = %self, "Login not completed");
            }
            ErrorKind::Network | ErrorKind::Storage | ErrorKind::Config => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Dashboard error"
                );
            }
        }
    }
}

/// Set the Sentry user context for the signed-in user.
pub fn set_sentry_user(name: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(name.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
