//! Backend session cookies.
//!
//! The backend keeps the login in a cookie. [`SessionCookies`] is the cookie
//! store the HTTP client uses; when backed by a file it records every
//! `Set-Cookie` header it accepts and replays them on the next start, so a
//! restored session can still talk to the backend.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::storage::StorageError;

/// A `Set-Cookie` header and the URL that sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SavedCookie {
    url: String,
    header: String,
}

/// Saved headers keyed by cookie name.
type Saved = BTreeMap<String, SavedCookie>;

#[derive(Default)]
struct CookieState {
    jar: Jar,
    saved: Saved,
}

/// Cookie store for the backend client, optionally persisted to a file.
pub struct SessionCookies {
    state: RwLock<CookieState>,
    path: Option<PathBuf>,
}

impl SessionCookies {
    /// Cookies kept for this process only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(CookieState::default()),
            path: None,
        }
    }

    /// Cookies persisted at `path`, restoring any saved earlier.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let saved: Saved = match fs::read_to_string(&path) {
            Ok(json) if json.trim().is_empty() => Saved::new(),
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Saved::new(),
            Err(e) => return Err(e.into()),
        };

        let jar = Jar::default();
        for (name, cookie) in &saved {
            match Url::parse(&cookie.url) {
                Ok(url) => jar.add_cookie_str(&cookie.header, &url),
                Err(e) => tracing::warn!(cookie = %name, error = %e, "Skipping saved cookie"),
            }
        }
        tracing::debug!(cookies = saved.len(), "Session cookies loaded");

        Ok(Self {
            state: RwLock::new(CookieState { jar, saved }),
            path: Some(path),
        })
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether no backend cookie is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .saved
            .is_empty()
    }

    /// Drop every cookie and delete the backing file.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = CookieState::default();

        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => tracing::debug!("Session cookies removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(error = %e, "Failed to remove session cookies"),
            }
        }
    }

    fn persist(&self, saved: &Saved) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(saved)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<HeaderValue> = cookie_headers.cloned().collect();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.jar.set_cookies(&mut headers.iter(), url);

        let mut changed = false;
        for raw in headers.iter().filter_map(|h| h.to_str().ok()) {
            let Some(name) = cookie_name(raw) else {
                continue;
            };
            if removes_cookie(raw) {
                changed |= state.saved.remove(name).is_some();
            } else {
                state.saved.insert(
                    name.to_string(),
                    SavedCookie {
                        url: url.to_string(),
                        header: raw.to_string(),
                    },
                );
                changed = true;
            }
        }

        if changed && let Err(e) = self.persist(&state.saved) {
            tracing::warn!(error = %e, "Failed to save session cookies");
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .jar
            .cookies(url)
    }
}

impl std::fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Cookie values are credentials
        f.debug_struct("SessionCookies")
            .field("path", &self.path)
            .field("empty", &self.is_empty())
            .finish()
    }
}

/// Name of the cookie a `Set-Cookie` header sets.
fn cookie_name(header: &str) -> Option<&str> {
    let (name, _) = header.split(';').next()?.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

/// Whether a `Set-Cookie` header deletes its cookie with a non-positive
/// `Max-Age`.
fn removes_cookie(header: &str) -> bool {
    header.split(';').skip(1).any(|attr| {
        attr.split_once('=').is_some_and(|(key, value)| {
            key.trim().eq_ignore_ascii_case("max-age")
                && value.trim().parse::<i64>().is_ok_and(|age| age <= 0)
        })
    })
}
