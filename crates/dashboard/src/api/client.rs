//! HTTP client for the dashboard backend.

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::{DashboardConfig, EndpointPaths};

use super::cookies::SessionCookies;
use super::error::{ApiError, ApiErrorResponse};
use super::types::{
    HealthResponse, LoginRequest, LoginResponse, LogoutResponse, ProfileResponse, SheetResponse,
};
use super::{AuthApi, SheetsApi};

/// Query parameter carrying the search term.
const CUSTOMER_PARAM: &str = "customer";

/// Backend API client.
///
/// Keeps a cookie store so the session cookie set by credential verification
/// is sent with every later request, including from clones of the client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    cookies: Arc<SessionCookies>,
    base: Url,
    endpoints: EndpointPaths,
}

impl ApiClient {
    /// Create a client for the backend described by `config`, keeping
    /// cookies in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        Self::with_cookies(config, SessionCookies::in_memory())
    }

    /// Create a client that keeps its cookies in `cookies`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_cookies(
        config: &DashboardConfig,
        cookies: SessionCookies,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let cookies = Arc::new(cookies);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(cookies.clone())
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                cookies,
                base: config.api_url.clone(),
                endpoints: config.endpoints.clone(),
            }),
        })
    }

    /// Cookies sent to the backend.
    #[must_use]
    pub fn cookies(&self) -> &SessionCookies {
        &self.inner.cookies
    }

    /// Drop the backend session cookie without contacting the backend.
    pub fn forget_session(&self) {
        self.inner.cookies.clear();
    }

    /// API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Search the sheet for rows belonging to `term`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply cannot be parsed.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<SheetResponse, ApiError> {
        let mut url = self.endpoint(&self.inner.endpoints.search)?;
        url.query_pairs_mut().append_pair(CUSTOMER_PARAM, term);

        let response = self.inner.client.get(url).send().await?;
        let sheet: SheetResponse = read_json(response).await?;
        if let Some(message) = sheet.message.as_deref().filter(|_| sheet.data.is_none()) {
            tracing::debug!(message, "Backend found no rows");
        }
        Ok(sheet)
    }

    /// Verify an identity-provider credential.
    ///
    /// On success the backend sets its session cookie, which this client keeps.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend rejects the
    /// credential with an error status, or the reply cannot be parsed.
    #[instrument(skip_all)]
    pub async fn login(&self, credential: &SecretString) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&self.inner.endpoints.google_login)?;
        let request = LoginRequest {
            credential: credential.expose_secret(),
        };

        let response = self.inner.client.post(url).json(&request).send().await?;
        read_json(response).await
    }

    /// End the backend session and drop its cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<LogoutResponse, ApiError> {
        let url = self.endpoint(&self.inner.endpoints.logout)?;
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }

    /// Identity held by the backend session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; an expired or missing backend
    /// session yields an unauthorized [`ApiError::Status`].
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<ProfileResponse, ApiError> {
        let url = self.endpoint(&self.inner.endpoints.profile)?;
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }

    /// Backend health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        let url = self.endpoint(&self.inner.endpoints.health)?;
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }

    /// Absolute URL of an endpoint path.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        endpoint_url(&self.inner.base, path)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base.as_str())
            .finish_non_exhaustive()
    }
}

impl SheetsApi for ApiClient {
    async fn search_customers(&self, term: &str) -> Result<Vec<Vec<Value>>, ApiError> {
        Ok(self.search(term).await?.into_rows())
    }
}

impl AuthApi for ApiClient {
    async fn verify_credential(&self, credential: &SecretString) -> Result<LoginResponse, ApiError> {
        self.login(credential).await
    }

    async fn end_remote_session(&self) -> Result<LogoutResponse, ApiError> {
        self.logout().await
    }
}

/// Append `path` to the base URL, keeping any path prefix the base carries.
fn endpoint_url(base: &Url, path: &str) -> Result<Url, ApiError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Ok(Url::parse(&joined)?)
}

/// Read a JSON body, turning error statuses into [`ApiError::Status`].
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.message())
            .unwrap_or(body);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_paths() {
        let base = Url::parse("http://localhost:8080").unwrap();
        assert_eq!(
            endpoint_url(&base, "/api/sheets").unwrap().as_str(),
            "http://localhost:8080/api/sheets"
        );

        let prefixed = Url::parse("https://example.com/backend/").unwrap();
        assert_eq!(
            endpoint_url(&prefixed, "/api/login/google").unwrap().as_str(),
            "https://example.com/backend/api/login/google"
        );
    }

    #[test]
    fn test_search_term_is_query_encoded() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let mut url = endpoint_url(&base, "/api/sheets").unwrap();
        url.query_pairs_mut().append_pair(CUSTOMER_PARAM, "王 小明&co");
        assert_eq!(url.query_pairs().next().unwrap().1, "王 小明&co");
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_client_keeps_base_url() {
        let config = DashboardConfig::for_api("http://127.0.0.1:9999").unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9999/");
        assert!(client.cookies().path().is_none());
    }
}
