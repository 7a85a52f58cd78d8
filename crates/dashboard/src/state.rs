//! Dashboard state shared across views.
//!
//! [`Dashboard`] wires the session store, route gate, search dispatcher,
//! login flow, table view and profile adapter onto one storage and one
//! navigation history.

use std::sync::Arc;

use little_sun_core::{Route, UserInfo};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::api::{ApiClient, SessionCookies};
use crate::components::{ProfileAdapter, TableView};
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::middleware::{GuardOutcome, RouteGuard};
use crate::navigation::{History, Navigator};
use crate::services::{
    IdentityProvider, LoginFlow, ProvidedCredential, SearchDispatcher, SearchError, SearchOutcome,
    SearchStatus, SessionStore,
};
use crate::storage::{FileStore, KeyValueStore};

/// Dashboard state shared across views.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    api: ApiClient,
    history: Arc<History>,
    session: Arc<SessionStore>,
    guard: RouteGuard,
    search: SearchDispatcher<ApiClient>,
    login: LoginFlow<ApiClient>,
    table: TableView,
    profile: Arc<ProfileAdapter>,
}

impl Dashboard {
    /// Build the dashboard over `storage`, restoring any persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a stale session
    /// cannot be removed from storage.
    pub fn new(
        config: DashboardConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, DashboardError> {
        let api = ApiClient::new(&config)?;
        Self::with_api(config, storage, api)
    }

    fn with_api(
        config: DashboardConfig,
        storage: Arc<dyn KeyValueStore>,
        api: ApiClient,
    ) -> Result<Self, DashboardError> {
        let history = Arc::new(History::default());
        let navigator: Arc<dyn Navigator> = history.clone();

        let session = Arc::new(SessionStore::load(storage.clone(), navigator.clone())?);
        let guard = RouteGuard::new(session.clone(), navigator.clone());
        let search = SearchDispatcher::new(api.clone());
        let login = LoginFlow::new(api.clone(), session.clone(), navigator.clone());
        let table = TableView::new(config.page_size);
        let profile = Arc::new(ProfileAdapter::new(storage, session.clone(), navigator));

        // A cookie without a live local session belongs to nobody
        if !session.is_logged_in() && !api.cookies().is_empty() {
            tracing::debug!("Dropping cookies of an ended session");
            api.forget_session();
        }

        tracing::info!(
            api_url = %config.api_url,
            logged_in = session.is_logged_in(),
            "Dashboard ready"
        );

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                api,
                history,
                session,
                guard,
                search,
                login,
                table,
                profile,
            }),
        })
    }

    /// Build the dashboard over the configured state file.
    ///
    /// The backend session cookie is kept in [`DashboardConfig::cookie_file`]
    /// so a restored session can still reach the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the state or cookie file cannot be read, or see
    /// [`Dashboard::new`].
    pub fn open(config: DashboardConfig) -> Result<(Self, FileStore), DashboardError> {
        let store = FileStore::open(&config.state_file)?;
        let cookies = SessionCookies::load(config.cookie_file())?;
        let api = ApiClient::with_cookies(&config, cookies)?;
        let dashboard = Self::with_api(config, Arc::new(store.clone()), api)?;
        Ok((dashboard, store))
    }

    /// Navigate to `path`.
    ///
    /// An expired session is cleared first. Protected routes then go through
    /// the route gate; the login route is entered directly, and moves on to
    /// the dashboard view if already logged in. Returns the route shown
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if an expired session could not be removed.
    #[instrument(skip(self))]
    pub fn navigate(&self, path: &str) -> Result<Route, DashboardError> {
        let inner = &self.inner;
        let route = Route::resolve(path);

        if inner.session.expire_if_stale()? {
            inner.api.forget_session();
            DashboardError::SessionExpired.report();
            // Clearing already redirected to login, whatever the target
            return Ok(inner.history.current());
        }

        if route.is_protected() {
            match inner.guard.can_activate(route) {
                GuardOutcome::Allowed => inner.history.navigate(route),
                GuardOutcome::RedirectedToLogin | GuardOutcome::Denied => {
                    tracing::debug!(target = %route, "Navigation denied");
                }
            }
        } else {
            inner.history.navigate(route);
            inner.login.enter();
        }

        Ok(inner.history.current())
    }

    /// Log in with a credential obtained outside the dashboard.
    ///
    /// # Errors
    ///
    /// See [`LoginFlow::submit_credential`].
    pub async fn login(&self, credential: &str) -> Result<UserInfo, DashboardError> {
        self.sign_in(&ProvidedCredential::new(credential)).await
    }

    /// Log in with a credential from `provider`.
    ///
    /// # Errors
    ///
    /// See [`LoginFlow::sign_in`].
    pub async fn sign_in<P: IdentityProvider>(
        &self,
        provider: &P,
    ) -> Result<UserInfo, DashboardError> {
        let user = self.inner.login.sign_in(provider).await?;
        self.inner.profile.refresh();
        Ok(user)
    }

    /// Search for `term` and show the results in the table.
    ///
    /// A stale reply leaves the table untouched; a failed search leaves the
    /// previous rows in place. When the backend no longer accepts a session
    /// that is logged in locally, the session is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::SessionExpired`] when the backend session
    /// has ended, or see [`SearchDispatcher::search`].
    pub async fn search(&self, term: &str) -> Result<SearchOutcome, DashboardError> {
        let outcome = match self.inner.search.search(term).await {
            Ok(outcome) => outcome,
            Err(SearchError::Api(e))
                if e.is_unauthorized() && self.inner.session.is_logged_in() =>
            {
                tracing::info!(error = %e, "Backend session ended");
                self.inner.api.forget_session();
                self.inner.profile.logout()?;
                return Err(DashboardError::SessionExpired);
            }
            Err(e) => return Err(e.into()),
        };
        match &outcome {
            SearchOutcome::Results(records) => self.inner.table.set_data(records.clone()),
            SearchOutcome::NoResults => self.inner.table.set_data(Vec::new()),
            SearchOutcome::Stale => {}
        }
        Ok(outcome)
    }

    /// Log out of the backend and locally.
    ///
    /// The backend call is best effort; the local session is cleared either
    /// way.
    ///
    /// # Errors
    ///
    /// Returns an error if the local session could not be removed.
    pub async fn logout(&self) -> Result<(), DashboardError> {
        self.inner.login.end_remote_session().await;
        self.inner.api.forget_session();
        self.inner.profile.logout()?;
        Ok(())
    }

    /// Keep the profile display in step with storage changes.
    #[must_use]
    pub fn watch_storage(&self) -> JoinHandle<()> {
        self.inner.profile.spawn_listener()
    }

    /// Route currently shown.
    #[must_use]
    pub fn current_route(&self) -> Route {
        self.inner.history.current()
    }

    /// Status of the latest search.
    #[must_use]
    pub fn search_status(&self) -> SearchStatus {
        self.inner.search.status()
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.inner.history
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn table(&self) -> &TableView {
        &self.inner.table
    }

    #[must_use]
    pub fn profile(&self) -> &ProfileAdapter {
        &self.inner.profile
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("route", &self.current_route())
            .field("session", &self.inner.session)
            .field("table", &self.inner.table)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::models::session_keys as keys;
    use crate::storage::MemoryStore;

    fn dashboard(storage: &MemoryStore) -> Dashboard {
        // Nothing listens here; these tests never reach the network
        let config = DashboardConfig::for_api("http://127.0.0.1:9").unwrap();
        Dashboard::new(config, Arc::new(storage.clone())).unwrap()
    }

    fn persist_session(storage: &MemoryStore, expires_in: Duration) {
        storage
            .set_many(&[
                (keys::IS_LOGGED_IN, "true"),
                (keys::USER_NAME, "Lin"),
                (keys::USER_PICTURE, "p.png"),
                (keys::EXPIRE_AT, &(Utc::now() + expires_in).to_rfc3339()),
            ])
            .unwrap();
    }

    #[test]
    fn test_startup_without_session_lands_on_login() {
        let storage = MemoryStore::new();
        let dashboard = dashboard(&storage);

        assert!(!dashboard.session().is_logged_in());
        assert_eq!(dashboard.current_route(), Route::Login);
        assert!(!dashboard.profile().display().is_logged_in);
    }

    #[test]
    fn test_protected_route_redirects_to_login() {
        let storage = MemoryStore::new();
        let dashboard = dashboard(&storage);
        let before = dashboard.history().count(Route::Login);

        assert_eq!(dashboard.navigate("/dashboard").unwrap(), Route::Login);
        assert_eq!(dashboard.history().count(Route::Login), before + 1);
        assert_eq!(dashboard.history().count(Route::Dashboard), 0);
    }

    #[test]
    fn test_restored_session_can_navigate() {
        let storage = MemoryStore::new();
        persist_session(&storage, Duration::hours(1));
        let dashboard = dashboard(&storage);

        assert!(dashboard.session().is_logged_in());
        assert_eq!(dashboard.navigate("/").unwrap(), Route::Table);
        assert_eq!(dashboard.navigate("/address-form").unwrap(), Route::AddressForm);
        assert_eq!(dashboard.profile().display().user_name, "Lin");
    }

    #[test]
    fn test_login_route_when_logged_in_goes_to_dashboard() {
        let storage = MemoryStore::new();
        persist_session(&storage, Duration::hours(1));
        let dashboard = dashboard(&storage);

        assert_eq!(dashboard.navigate("/login").unwrap(), Route::Dashboard);
    }

    #[test]
    fn test_unknown_path_goes_to_login() {
        let storage = MemoryStore::new();
        persist_session(&storage, Duration::hours(1));
        let dashboard = dashboard(&storage);

        // Logged in users pass through the login view to the dashboard
        assert_eq!(dashboard.navigate("/nowhere").unwrap(), Route::Dashboard);
        assert_eq!(dashboard.history().count(Route::Login), 1);
    }

    #[test]
    fn test_session_expiring_while_open_is_cleared_on_navigation() {
        let storage = MemoryStore::new();
        persist_session(&storage, Duration::hours(1));
        let dashboard = dashboard(&storage);
        assert_eq!(dashboard.navigate("/table").unwrap(), Route::Table);

        storage
            .set(
                keys::EXPIRE_AT,
                &(Utc::now() - Duration::seconds(1)).to_rfc3339(),
            )
            .unwrap();

        let logins = dashboard.history().count(Route::Login);
        assert_eq!(dashboard.navigate("/table").unwrap(), Route::Login);
        assert_eq!(dashboard.history().count(Route::Login), logins + 1);
        assert!(!dashboard.session().is_logged_in());
        assert_eq!(storage.get(keys::IS_LOGGED_IN), None);
    }

    #[test]
    fn test_stale_session_on_login_route_records_one_entry() {
        let storage = MemoryStore::new();
        persist_session(&storage, Duration::hours(1));
        let dashboard = dashboard(&storage);
        storage
            .set(
                keys::EXPIRE_AT,
                &(Utc::now() - Duration::seconds(1)).to_rfc3339(),
            )
            .unwrap();

        let logins = dashboard.history().count(Route::Login);
        assert_eq!(dashboard.navigate("/login").unwrap(), Route::Login);
        assert_eq!(dashboard.history().count(Route::Login), logins + 1);
        assert!(!dashboard.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_empty_search_is_validation_error() {
        let storage = MemoryStore::new();
        let dashboard = dashboard(&storage);

        let err = dashboard.search("   ").await.unwrap_err();
        assert_eq!(err.user_message(), "Please enter a search term");
        assert_eq!(
            dashboard.search_status().error.as_deref(),
            Some("Please enter a search term")
        );
    }

    #[test]
    fn test_open_uses_state_file() {
        let dir = TempDir::new().unwrap();
        let mut config = DashboardConfig::for_api("http://127.0.0.1:9").unwrap();
        config.state_file = dir.path().join("session.json");

        let (dashboard, store) = Dashboard::open(config).unwrap();
        assert_eq!(store.path(), dir.path().join("session.json"));
        assert!(!dashboard.session().is_logged_in());
    }

    #[test]
    fn test_open_without_session_drops_saved_cookies() {
        let dir = TempDir::new().unwrap();
        let mut config = DashboardConfig::for_api("http://127.0.0.1:9").unwrap();
        config.state_file = dir.path().join("session.json");
        std::fs::write(
            config.cookie_file(),
            r#"{"sid": {"url": "http://127.0.0.1:9/api/login/google", "header": "sid=abc; Path=/"}}"#,
        )
        .unwrap();

        let (dashboard, _store) = Dashboard::open(config.clone()).unwrap();

        assert!(dashboard.api().cookies().is_empty());
        assert!(!config.cookie_file().exists());
    }
}
