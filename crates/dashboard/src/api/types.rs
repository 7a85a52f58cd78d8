//! Backend request and response bodies.

use little_sun_core::{Email, UserInfo, parse_expiry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the credential verification request.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Opaque identity-provider credential.
    pub credential: &'a str,
}

/// Reply to a credential verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Raw expiry timestamp, parsed leniently by [`LoginResponse::user_info`].
    #[serde(default, rename = "expire_session")]
    pub expire_session: Option<String>,
    #[serde(default)]
    pub active_sessions: Option<i64>,
}

impl LoginResponse {
    /// The signed-in identity carried by this reply.
    ///
    /// An email the provider reported in an unusable form is dropped, as is
    /// an expiry that is not a recognizable timestamp.
    #[must_use]
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            name: self.name.clone(),
            picture: self.picture.clone(),
            email: self.email.as_deref().and_then(|e| Email::parse(e).ok()),
            expires_at: self.expire_session.as_deref().and_then(parse_expiry),
        }
    }
}

/// Reply to a customer search.
///
/// The backend answers `{"data": [...]}` with matching rows, or
/// `{"message": "..."}` when nothing matched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetResponse {
    #[serde(default)]
    pub data: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SheetResponse {
    /// Matching rows, empty when the backend only sent a message.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.data.unwrap_or_default()
    }
}

/// Reply to a backend logout.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub logout: bool,
}

/// Identity held by the backend session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub active_sessions: i64,
}

/// Backend health.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    /// Whether the backend reports itself healthy.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
