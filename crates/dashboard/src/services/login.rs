//! Login flow.
//!
//! The identity provider is an injected capability that produces an opaque
//! credential. The flow forwards that credential to the backend, and on
//! success populates the session store and moves to the dashboard view.

use std::future::Future;
use std::sync::Arc;

use little_sun_core::{Email, Route, UserInfo};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiError, AuthApi};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::navigation::Navigator;
use crate::services::SessionStore;
use crate::storage::StorageError;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityProviderError {
    /// The user dismissed the sign-in prompt or supplied nothing.
    #[error("sign-in was cancelled")]
    Cancelled,

    /// The provider could not be reached or failed.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors from a login attempt.
#[derive(Debug, Error)]
pub enum LoginError {
    /// No credential was obtained.
    #[error(transparent)]
    Identity(#[from] IdentityProviderError),

    /// The backend did not accept the credential.
    #[error("login denied: {reason}")]
    AuthDenied {
        /// Diagnostic from the backend.
        reason: String,
    },

    /// The verification request failed.
    #[error(transparent)]
    Network(#[from] ApiError),

    /// The session could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Opaque credential issued by Google Identity Services.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct GoogleCredential(SecretString);

impl GoogleCredential {
    /// Wrap a raw credential string.
    #[must_use]
    pub fn new(credential: impl Into<String>) -> Self {
        Self(SecretString::from(credential.into()))
    }

    /// The credential as a secret.
    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.0
    }

    /// Whether the credential is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for GoogleCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GoogleCredential([REDACTED])")
    }
}

/// Source of identity-provider credentials.
pub trait IdentityProvider: Send + Sync {
    /// Obtain a credential, prompting the user if needed.
    fn request_credential(
        &self,
    ) -> impl Future<Output = Result<GoogleCredential, IdentityProviderError>> + Send;
}

/// Identity provider that hands out a credential obtained elsewhere, such as
/// one pasted into a terminal.
#[derive(Debug, Clone)]
pub struct ProvidedCredential(Option<GoogleCredential>);

impl ProvidedCredential {
    /// Provide `credential`.
    #[must_use]
    pub fn new(credential: impl Into<String>) -> Self {
        let credential = GoogleCredential::new(credential);
        Self((!credential.is_blank()).then_some(credential))
    }
}

impl IdentityProvider for ProvidedCredential {
    async fn request_credential(&self) -> Result<GoogleCredential, IdentityProviderError> {
        self.0.clone().ok_or(IdentityProviderError::Cancelled)
    }
}

/// Drives login and backend logout.
pub struct LoginFlow<A> {
    api: A,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl<A: AuthApi> LoginFlow<A> {
    /// Create a login flow.
    #[must_use]
    pub fn new(api: A, session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            session,
            navigator,
        }
    }

    /// Enter the login view.
    ///
    /// A user who is already logged in is sent to the dashboard instead.
    /// Returns `true` when that redirect happened.
    pub fn enter(&self) -> bool {
        if self.session.is_logged_in() {
            tracing::debug!("Already logged in, leaving login view");
            self.navigator.navigate(Route::Dashboard);
            return true;
        }
        false
    }

    /// Obtain a credential from `provider` and submit it.
    ///
    /// # Errors
    ///
    /// Returns an error if no credential was obtained, or see
    /// [`LoginFlow::submit_credential`].
    pub async fn sign_in<P: IdentityProvider>(&self, provider: &P) -> Result<UserInfo, LoginError> {
        let credential = provider.request_credential().await?;
        self.submit_credential(&credential).await
    }

    /// Verify `credential` with the backend and start the session.
    ///
    /// On success the session store is populated and the user is sent to
    /// the dashboard view. On denial the user stays on the login view.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::AuthDenied`] if the backend does not accept the
    /// credential, [`LoginError::Network`] if the request fails, and
    /// [`LoginError::Storage`] if the session cannot be persisted.
    #[instrument(skip_all)]
    pub async fn submit_credential(
        &self,
        credential: &GoogleCredential,
    ) -> Result<UserInfo, LoginError> {
        let response = match self.api.verify_credential(credential.secret()).await {
            Ok(response) => response,
            Err(e) if e.is_unauthorized() => {
                tracing::warn!(error = %e, "Credential rejected by backend");
                return Err(LoginError::AuthDenied {
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Credential verification failed");
                return Err(e.into());
            }
        };

        if !response.is_logged_in {
            tracing::warn!(name = %response.name, "Backend reported not logged in");
            return Err(LoginError::AuthDenied {
                reason: "backend reported not logged in".to_string(),
            });
        }

        let user = response.user_info();
        self.session.set_logged_in(user.clone())?;
        set_sentry_user(&user.name, user.email.as_ref().map(Email::as_str));
        tracing::info!(
            user = %user.name,
            active_sessions = response.active_sessions,
            "Login succeeded"
        );

        self.navigator.navigate(Route::Dashboard);
        Ok(user)
    }

    /// End the backend session.
    ///
    /// Best effort: a failure is logged and otherwise ignored, so it never
    /// stands in the way of clearing the local session.
    pub async fn end_remote_session(&self) {
        match self.api.end_remote_session().await {
            Ok(reply) => tracing::debug!(logout = reply.logout, "Backend session ended"),
            Err(e) => tracing::warn!(error = %e, "Backend logout failed"),
        }
        clear_sentry_user();
    }
}

impl<A> std::fmt::Debug for LoginFlow<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFlow")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
