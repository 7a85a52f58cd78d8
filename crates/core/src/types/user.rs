//! Signed-in user identity.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;

/// Identity of the signed-in user, as reported by the backend after
/// credential verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub picture: String,
    /// Email address, when the provider reported a usable one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    /// When the backend session ends.
    #[serde(
        default,
        rename = "expire_session",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserInfo {
    /// Create a user with just a name and picture.
    #[must_use]
    pub fn new(name: impl Into<String>, picture: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            picture: picture.into(),
            email: None,
            expires_at: None,
        }
    }

    /// Set the email address.
    #[must_use]
    pub fn with_email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }

    /// Set the session expiry.
    #[must_use]
    pub const fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Parse a session expiry timestamp.
///
/// Accepts RFC 3339 and, for values written without an offset, a naive
/// ISO 8601 date-time taken as UTC.
#[must_use]
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|at| at.and_utc())
        })
        .ok()
}
