//! Integration tests for the Little Sun dashboard.
//!
//! The tests drive a real [`Dashboard`](little_sun_dashboard::Dashboard)
//! against [`FakeBackend`], an in-process HTTP server that speaks the
//! spreadsheet backend's protocol. No external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p little-sun-integration-tests
//! ```
//!
//! # Fake Backend
//!
//! - `POST /api/login/google` accepts [`VALID_CREDENTIAL`] and sets a
//!   session cookie; anything else is refused with 401
//! - `GET /api/sheets?customer=` filters the configured rows by customer
//!   name and requires the session cookie
//! - `GET /api/profile` requires the session cookie
//! - `GET /api/logout` always answers and ends the session when the cookie
//!   is sent
//! - `GET /api/health` always answers

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration as StdDuration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use little_sun_dashboard::DashboardConfig;
use little_sun_dashboard::config::ConfigError;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// The only credential the fake backend accepts.
pub const VALID_CREDENTIAL: &str = "header.valid-google-credential.signature";

/// Identity the fake backend reports for [`VALID_CREDENTIAL`].
pub const USER_NAME: &str = "Lin Mei";
pub const USER_EMAIL: &str = "lin.mei@example.com";
pub const USER_PICTURE: &str = "https://example.com/lin.png";

const SESSION_COOKIE: &str = "little_sun_sid";
const SESSION_ID: &str = "fake-session";

/// Spreadsheet rows served by default.
///
/// Cells are positional, as the backend sends them. Amounts mix numbers and
/// numeric strings.
#[must_use]
pub fn sample_rows() -> Vec<Vec<Value>> {
    let rows = json!([
        [
            "2024-03-01", "Lin Mei", "1990-05-04", "SN-001", "Haircut",
            "Wash", "", "Tea", "", "regular", 120, 80
        ],
        [
            "2024-03-02", "Alexandra Wu", "1985-11-30", "SN-002", "Colour",
            "Cut", "Mask", "", "", "", "1,250.50", "900"
        ],
        [
            "2024-03-05", "Lin Mei", "1990-05-04", "SN-003", "Nails",
            "", "", "", "", "second visit", 45.5, 30
        ],
    ]);
    serde_json::from_value(rows).unwrap_or_default()
}

#[derive(Default)]
struct BackendState {
    rows: Mutex<Vec<Vec<Value>>>,
    search_failure: Mutex<Option<(StatusCode, Value)>>,
    search_delays: Mutex<HashMap<String, StdDuration>>,
    searches: Mutex<Vec<String>>,
    session_active: AtomicBool,
    logins: AtomicUsize,
    logouts: AtomicUsize,
}

impl BackendState {
    fn rows(&self) -> Vec<Vec<Value>> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// In-process stand-in for the spreadsheet backend.
///
/// The server stops when the value is dropped.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start the backend on an ephemeral local port, serving [`sample_rows`].
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(BackendState {
            rows: Mutex::new(sample_rows()),
            ..BackendState::default()
        });

        let app = Router::new()
            .route("/api/login/google", post(login))
            .route("/api/sheets", get(sheets))
            .route("/api/profile", get(profile))
            .route("/api/logout", get(logout))
            .route("/api/health", get(health))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Dashboard configuration pointing at this backend and persisting the
    /// session under `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is rejected.
    pub fn config(&self, state_dir: &Path) -> Result<DashboardConfig, ConfigError> {
        let mut config = DashboardConfig::for_api(&self.url())?;
        config.state_file = state_dir.join("session.json");
        Ok(config)
    }

    /// Replace the rows searches are answered from.
    pub fn set_rows(&self, rows: Vec<Vec<Value>>) {
        *self.state.rows.lock().unwrap_or_else(PoisonError::into_inner) = rows;
    }

    /// Answer every following search with `status` and `body`.
    pub fn fail_searches(&self, status: StatusCode, body: Value) {
        *self
            .state
            .search_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((status, body));
    }

    /// Hold back the reply to searches for `term` by `delay`.
    pub fn delay_search(&self, term: &str, delay: StdDuration) {
        self.state
            .search_delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(term.to_string(), delay);
    }

    /// Terms received by authenticated searches, in order.
    #[must_use]
    pub fn searches(&self) -> Vec<String> {
        self.state
            .searches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of accepted logins.
    #[must_use]
    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    /// Number of logout requests.
    #[must_use]
    pub fn logouts(&self) -> usize {
        self.state.logouts.load(Ordering::SeqCst)
    }

    /// Whether a login session is live on the backend.
    #[must_use]
    pub fn session_active(&self) -> bool {
        self.state.session_active.load(Ordering::SeqCst)
    }

    /// End the backend session, as a server-side timeout would.
    pub fn end_sessions(&self) {
        self.state.session_active.store(false, Ordering::SeqCst);
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

#[derive(Deserialize)]
struct LoginBody {
    credential: String,
}

fn has_session(state: &BackendState, headers: &HeaderMap) -> bool {
    if !state.session_active.load(Ordering::SeqCst) {
        return false;
    }
    let expected = format!("{SESSION_COOKIE}={SESSION_ID}");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .any(|pair| pair.trim() == expected)
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<LoginBody>) -> Response {
    if body.credential != VALID_CREDENTIAL {
        return error_reply(StatusCode::UNAUTHORIZED, "Invalid Google credential");
    }

    state.logins.fetch_add(1, Ordering::SeqCst);
    state.session_active.store(true, Ordering::SeqCst);
    let cookie = format!("{SESSION_COOKIE}={SESSION_ID}; Path=/; HttpOnly");
    let reply = json!({
        "email": USER_EMAIL,
        "name": USER_NAME,
        "picture": USER_PICTURE,
        "isLoggedIn": true,
        "expire_session": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        "activeSessions": 1,
    });
    ([(header::SET_COOKIE, cookie)], Json(reply)).into_response()
}

async fn sheets(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !has_session(&state, &headers) {
        return error_reply(StatusCode::UNAUTHORIZED, "Not authenticated");
    }

    let term = params.get("customer").cloned().unwrap_or_default();
    state
        .searches
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(term.clone());

    let delay = state
        .search_delays
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&term)
        .copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let failure = state
        .search_failure
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if let Some((status, body)) = failure {
        return (status, Json(body)).into_response();
    }

    let needle = term.to_lowercase();
    let matches: Vec<Vec<Value>> = state
        .rows()
        .into_iter()
        .filter(|row| {
            row.get(1)
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect();

    if matches.is_empty() {
        Json(json!({ "message": "No data found" })).into_response()
    } else {
        Json(json!({ "data": matches })).into_response()
    }
}

async fn profile(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if !has_session(&state, &headers) {
        return error_reply(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    Json(json!({
        "email": USER_EMAIL,
        "name": USER_NAME,
        "picture": USER_PICTURE,
        "activeSessions": 1,
    }))
    .into_response()
}

async fn logout(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.logouts.fetch_add(1, Ordering::SeqCst);
    if has_session(&state, &headers) {
        state.session_active.store(false, Ordering::SeqCst);
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    ([(header::SET_COOKIE, cookie)], Json(json!({ "logout": true }))).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
