//! Navigation between dashboard views.

use std::sync::{PoisonError, RwLock};

use little_sun_core::Route;
use tokio::sync::broadcast;

use crate::signal::Signal;

/// Most navigations [`History`] remembers; older entries are dropped.
pub const HISTORY_LIMIT: usize = 256;

/// Something that can move the user to another view.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`.
    fn navigate(&self, route: Route);
}

/// Navigation history.
///
/// Records the latest [`HISTORY_LIMIT`] navigations in order and exposes the
/// current route as an observable value.
#[derive(Debug)]
pub struct History {
    entries: RwLock<Vec<Route>>,
    current: Signal<Route>,
}

impl History {
    /// Start with `initial` as the current route.
    ///
    /// The initial route is not counted as a navigation.
    #[must_use]
    pub fn new(initial: Route) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            current: Signal::new(initial),
        }
    }

    /// The route currently shown.
    #[must_use]
    pub fn current(&self) -> Route {
        self.current.get()
    }

    /// Remembered navigations, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<Route> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many remembered navigations went to `route`.
    #[must_use]
    pub fn count(&self, route: Route) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| **r == route)
            .count()
    }

    /// Subscribe to route changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}

impl Navigator for History {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "Navigating");
        {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            if entries.len() >= HISTORY_LIMIT {
                let excess = entries.len() + 1 - HISTORY_LIMIT;
                entries.drain(..excess);
            }
            entries.push(route);
        }
        self.current.set(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_navigations() {
        let history = History::new(Route::Login);
        assert_eq!(history.current(), Route::Login);
        assert!(history.entries().is_empty());

        history.navigate(Route::Dashboard);
        history.navigate(Route::Table);
        history.navigate(Route::Dashboard);

        assert_eq!(history.current(), Route::Dashboard);
        assert_eq!(
            history.entries(),
            vec![Route::Dashboard, Route::Table, Route::Dashboard]
        );
        assert_eq!(history.count(Route::Dashboard), 2);
        assert_eq!(history.count(Route::Login), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let history = History::default();
        history.navigate(Route::Table);
        for _ in 0..HISTORY_LIMIT {
            history.navigate(Route::Dashboard);
        }

        let entries = history.entries();
        assert_eq!(entries.len(), HISTORY_LIMIT);
        // The oldest entry made room
        assert_eq!(history.count(Route::Table), 0);
        assert_eq!(history.current(), Route::Dashboard);
    }
}
