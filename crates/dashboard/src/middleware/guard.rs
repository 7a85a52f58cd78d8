//! Route access gate.
//!
//! Decides whether a navigation may proceed. Protected views require a
//! logged-in session; everyone else is sent to the login view.

use std::sync::Arc;

use little_sun_core::Route;

use crate::navigation::Navigator;
use crate::services::SessionStore;

/// Result of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The navigation may proceed.
    Allowed,
    /// Access denied; a redirect to the login view was issued.
    RedirectedToLogin,
    /// Access denied without a redirect (the target already is the login view).
    Denied,
}

impl GuardOutcome {
    /// Whether the navigation may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Gate consulted once per navigation attempt.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    /// Create a gate reading login state from `session`.
    #[must_use]
    pub fn new(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }

    /// Check whether `target` may be entered.
    ///
    /// Reads the current login flag once and never waits for later changes.
    /// When logged out, a target other than the login view triggers exactly
    /// one redirect to it.
    pub fn can_activate(&self, target: Route) -> GuardOutcome {
        if self.session.is_logged_in() {
            return GuardOutcome::Allowed;
        }

        if target == Route::Login {
            tracing::debug!("Logged out, already on login view");
            return GuardOutcome::Denied;
        }

        tracing::debug!(target = %target, "Logged out, redirecting to login");
        self.navigator.navigate(Route::Login);
        GuardOutcome::RedirectedToLogin
    }
}

impl std::fmt::Debug for RouteGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use little_sun_core::UserInfo;

    use super::*;
    use crate::navigation::History;
    use crate::storage::MemoryStore;

    fn guard() -> (RouteGuard, Arc<SessionStore>, Arc<History>) {
        let history = Arc::new(History::default());
        let session = Arc::new(SessionStore::new(
            Arc::new(MemoryStore::new()),
            history.clone(),
        ));
        (
            RouteGuard::new(session.clone(), history.clone()),
            session,
            history,
        )
    }

    #[test]
    fn test_denies_protected_route_with_one_redirect() {
        let (guard, _, history) = guard();

        assert_eq!(
            guard.can_activate(Route::Dashboard),
            GuardOutcome::RedirectedToLogin
        );
        assert_eq!(history.entries(), vec![Route::Login]);
    }

    #[test]
    fn test_login_target_is_denied_without_redirect() {
        let (guard, _, history) = guard();

        assert_eq!(guard.can_activate(Route::Login), GuardOutcome::Denied);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn test_allows_when_logged_in() {
        let (guard, session, history) = guard();
        session
            .set_logged_in(UserInfo::new("A", "p").expiring_at(Utc::now() + Duration::hours(1)))
            .unwrap();

        for route in [Route::Table, Route::Dashboard, Route::AddressForm, Route::Login] {
            assert!(guard.can_activate(route).is_allowed());
        }
        assert!(history.entries().is_empty());
    }
}
