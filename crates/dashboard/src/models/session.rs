//! Session-related types for dashboard authentication.
//!
//! Types persisted in durable storage for the login state.

use serde::{Deserialize, Serialize};

/// Storage keys for session fields.
///
/// These four keys are the whole persisted key space; nothing else about the
/// session survives a restart.
pub mod keys {
    /// Login flag, `"true"` when logged in and absent otherwise.
    pub const IS_LOGGED_IN: &str = "isLoggedIn";

    /// Display name of the signed-in user.
    pub const USER_NAME: &str = "userName";

    /// Avatar URL of the signed-in user.
    pub const USER_PICTURE: &str = "userPicture";

    /// Session expiry as an RFC 3339 timestamp.
    pub const EXPIRE_AT: &str = "expireAt";

    /// Every session key, in the order they are written.
    pub const ALL: [&str; 4] = [IS_LOGGED_IN, USER_NAME, USER_PICTURE, EXPIRE_AT];

    /// Value stored under [`IS_LOGGED_IN`] while logged in.
    pub const LOGGED_IN: &str = "true";
}

/// What the profile surface shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDisplay {
    /// Whether the login flag is set.
    pub is_logged_in: bool,
    /// Display name, empty when logged out.
    pub user_name: String,
    /// Avatar URL, empty when logged out.
    pub user_picture: String,
}

impl ProfileDisplay {
    /// The logged-out display.
    #[must_use]
    pub fn logged_out() -> Self {
        Self::default()
    }
}
