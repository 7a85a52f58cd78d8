//! Session state store.
//!
//! The single source of truth for "is someone logged in, and who". State is
//! held in memory as an observable [`SessionState`] and written through to a
//! [`KeyValueStore`] so a restart reconstructs it with
//! [`SessionStore::load_from_persistence`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use little_sun_core::{Route, UserInfo, parse_expiry};
use tokio::sync::broadcast;
use tracing::instrument;

use crate::models::session_keys as keys;
use crate::navigation::Navigator;
use crate::signal::Signal;
use crate::storage::{KeyValueStore, StorageError};

/// Snapshot of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Whether a user is logged in.
    pub is_logged_in: bool,
    /// The logged-in user, `None` when logged out.
    pub user: Option<UserInfo>,
}

impl SessionState {
    fn logged_in(user: UserInfo) -> Self {
        Self {
            is_logged_in: true,
            user: Some(user),
        }
    }
}

/// Holds the login state and persists it.
///
/// Every mutation writes to storage first and publishes afterwards, so a
/// subscriber that sees a new state can rely on it having been persisted.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    state: Signal<SessionState>,
    // Serializes write-then-publish sequences
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// Create a logged-out store.
    ///
    /// Nothing is read from storage until [`SessionStore::load_from_persistence`].
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            storage,
            navigator,
            state: Signal::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store and restore the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if a stale session could not be removed from storage.
    pub fn load(
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, StorageError> {
        let store = Self::new(storage, navigator);
        store.load_from_persistence()?;
        Ok(store)
    }

    /// Restore the session from storage.
    ///
    /// A session is restored only when it has not expired and the login flag
    /// is set. Anything else is cleared, which also navigates to the login
    /// view.
    ///
    /// # Errors
    ///
    /// Returns an error if a stale session could not be removed from storage.
    #[instrument(skip(self))]
    pub fn load_from_persistence(&self) -> Result<(), StorageError> {
        let flagged = self.storage.get(keys::IS_LOGGED_IN).as_deref() == Some(keys::LOGGED_IN);
        if self.is_expired() || !flagged {
            tracing::debug!(flagged, "No live session in storage");
            return self.clear();
        }

        let mut user = UserInfo::new(
            self.storage.get(keys::USER_NAME).unwrap_or_default(),
            self.storage.get(keys::USER_PICTURE).unwrap_or_default(),
        );
        user.expires_at = self.persisted_expiry();

        tracing::info!(user = %user.name, "Session restored");
        self.state.set(SessionState::logged_in(user));
        Ok(())
    }

    /// Whether the persisted session has expired.
    ///
    /// A missing or unreadable expiry counts as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the persisted session has expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.persisted_expiry()
            .is_none_or(|expires_at| expires_at <= now)
    }

    /// Persist `user` and mark the session logged in.
    ///
    /// The email is kept in memory only. A user without an expiry is logged
    /// in for this run but will not be restored after a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if storage could not be written; the in-memory state
    /// is left unchanged in that case.
    #[instrument(skip(self, user), fields(user = %user.name))]
    pub fn set_logged_in(&self, user: UserInfo) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let expire_at = user.expires_at.map(|at| at.to_rfc3339());
        let mut batch = vec![
            (keys::IS_LOGGED_IN, keys::LOGGED_IN),
            (keys::USER_NAME, user.name.as_str()),
            (keys::USER_PICTURE, user.picture.as_str()),
        ];
        // A previous session's expiry must not outlive it
        let stale: &[&str] = match expire_at.as_deref() {
            Some(expire_at) => {
                batch.push((keys::EXPIRE_AT, expire_at));
                &[]
            }
            None => &[keys::EXPIRE_AT],
        };
        self.storage.update(&batch, stale)?;

        self.state.set(SessionState::logged_in(user));
        tracing::info!("Logged in");
        Ok(())
    }

    /// Remove the persisted session, mark the state logged out and navigate
    /// to the login view.
    ///
    /// # Errors
    ///
    /// Returns an error if storage could not be written; nothing is published
    /// and no navigation happens in that case.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), StorageError> {
        {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.storage.remove_many(&keys::ALL)?;
            self.state.set(SessionState::default());
        }
        self.navigator.navigate(Route::Login);
        Ok(())
    }

    /// Clear the session if it is logged in but past its expiry.
    ///
    /// Returns `true` when the session was expired and has been cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the expired session could not be removed.
    pub fn expire_if_stale(&self) -> Result<bool, StorageError> {
        if !self.is_logged_in() || !self.is_expired() {
            return Ok(false);
        }
        tracing::info!("Session expired");
        self.clear()?;
        Ok(true)
    }

    /// Current login flag.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.get().is_logged_in
    }

    /// Currently logged-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<UserInfo> {
        self.state.get().user
    }

    /// Current session snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Subscribe to session changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn persisted_expiry(&self) -> Option<DateTime<Utc>> {
        self.storage
            .get(keys::EXPIRE_AT)
            .as_deref()
            .and_then(parse_expiry)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
