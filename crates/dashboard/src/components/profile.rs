//! Profile display adapter.
//!
//! Mirrors the persisted login flag, name and picture into a display state,
//! re-reading storage whenever it reports a change, including changes made
//! through another handle such as a second browsing context.

use std::sync::{Arc, Weak};

use little_sun_core::Route;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::models::{ProfileDisplay, session_keys as keys};
use crate::navigation::Navigator;
use crate::services::SessionStore;
use crate::signal::Signal;
use crate::storage::{KeyValueStore, StorageError};

/// Login/logout surface showing who is signed in.
pub struct ProfileAdapter {
    storage: Arc<dyn KeyValueStore>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    display: Signal<ProfileDisplay>,
}

impl ProfileAdapter {
    /// Create the adapter and read the initial display state.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let adapter = Self {
            storage,
            session,
            navigator,
            display: Signal::default(),
        };
        adapter.refresh();
        adapter
    }

    /// Re-read the persisted fields.
    ///
    /// Name and picture are cleared when the login flag is absent.
    pub fn refresh(&self) {
        let is_logged_in =
            self.storage.get(keys::IS_LOGGED_IN).as_deref() == Some(keys::LOGGED_IN);
        let display = if is_logged_in {
            ProfileDisplay {
                is_logged_in,
                user_name: self.storage.get(keys::USER_NAME).unwrap_or_default(),
                user_picture: self.storage.get(keys::USER_PICTURE).unwrap_or_default(),
            }
        } else {
            ProfileDisplay::logged_out()
        };

        if display != self.display.get() {
            tracing::debug!(is_logged_in, "Profile display updated");
            self.display.set(display);
        }
    }

    /// Listen for storage changes and refresh on each one.
    ///
    /// The task ends when the adapter is dropped or the storage channel
    /// closes.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.storage.subscribe();
        let adapter = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Profile listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
                let Some(adapter) = Weak::upgrade(&adapter) else {
                    break;
                };
                adapter.refresh();
            }
        })
    }

    /// Current display state.
    #[must_use]
    pub fn display(&self) -> ProfileDisplay {
        self.display.get()
    }

    /// Subscribe to display changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProfileDisplay> {
        self.display.subscribe()
    }

    /// Go to the login view.
    pub fn login(&self) {
        self.navigator.navigate(Route::Login);
    }

    /// Log out.
    ///
    /// Removes the displayed fields from storage, then hands over to the
    /// session store, which performs the full clear and navigates to the
    /// login view.
    ///
    /// # Errors
    ///
    /// Returns an error if storage could not be written.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.storage
            .remove_many(&[keys::IS_LOGGED_IN, keys::USER_NAME, keys::USER_PICTURE])?;
        self.session.clear()?;
        self.refresh();
        Ok(())
    }
}

impl std::fmt::Debug for ProfileAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileAdapter")
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}
