//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `LITTLE_SUN_API_URL` - Backend API base URL (default: `http://localhost:8080`)
//! - `LITTLE_SUN_GOOGLE_LOGIN_PATH` - Credential verification path (default: `/api/login/google`)
//! - `LITTLE_SUN_SEARCH_PATH` - Customer search path (default: `/api/sheets`)
//! - `LITTLE_SUN_LOGOUT_PATH` - Backend logout path (default: `/api/logout`)
//! - `LITTLE_SUN_PROFILE_PATH` - Backend profile path (default: `/api/profile`)
//! - `LITTLE_SUN_HEALTH_PATH` - Backend health path (default: `/api/health`)
//! - `LITTLE_SUN_PAGE_SIZE` - Initial table page size (default: 10)
//! - `LITTLE_SUN_STATE_FILE` - Durable session storage file (default: `.little-sun/session.json`)
//! - `LITTLE_SUN_ENV` - Environment name shown on the login view (default: development)
//! - `LITTLE_SUN_LOG_JSON` - Emit JSON logs (`true`/`false`, default: `true` in production)
//! - `GOOGLE_CLIENT_ID` - Google Identity Services client ID, shown on the login prompt
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::num::NonZeroUsize;
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_STATE_FILE: &str = ".little-sun/session.json";
const DEFAULT_ENV_NAME: &str = "development";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Backend endpoint paths, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPaths {
    pub google_login: String,
    pub search: String,
    pub logout: String,
    pub profile: String,
    pub health: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            google_login: "/api/login/google".to_string(),
            search: "/api/sheets".to_string(),
            logout: "/api/logout".to_string(),
            profile: "/api/profile".to_string(),
            health: "/api/health".to_string(),
        }
    }
}

/// Sentry error tracking configuration.
///
/// Implements `Debug` manually to redact the DSN.
#[derive(Clone)]
pub struct SentryConfig {
    pub dsn: SecretString,
    pub environment: Option<String>,
    /// Error sample rate (0.0 to 1.0)
    pub sample_rate: f32,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("dsn", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend API base URL (`apiBase`)
    pub api_url: Url,
    /// Endpoint paths under the API base
    pub endpoints: EndpointPaths,
    /// Initial rows per table page
    pub page_size: NonZeroUsize,
    /// File backing durable session storage
    pub state_file: PathBuf,
    /// Environment name (e.g., "development", "production")
    pub env_name: String,
    /// Google Identity Services client ID
    pub google_client_id: Option<String>,
    /// Emit logs as JSON instead of human-readable text
    pub log_json: bool,
    /// Sentry configuration (optional)
    pub sentry: Option<SentryConfig>,
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let api_url = parse_api_url(&or_default("LITTLE_SUN_API_URL", DEFAULT_API_URL))?;

        let defaults = EndpointPaths::default();
        let endpoints = EndpointPaths {
            google_login: or_default("LITTLE_SUN_GOOGLE_LOGIN_PATH", &defaults.google_login),
            search: or_default("LITTLE_SUN_SEARCH_PATH", &defaults.search),
            logout: or_default("LITTLE_SUN_LOGOUT_PATH", &defaults.logout),
            profile: or_default("LITTLE_SUN_PROFILE_PATH", &defaults.profile),
            health: or_default("LITTLE_SUN_HEALTH_PATH", &defaults.health),
        };

        let page_size = match var("LITTLE_SUN_PAGE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|e| ConfigError::InvalidEnvVar("LITTLE_SUN_PAGE_SIZE".to_string(), e.to_string()))?,
            None => little_sun_core::PageSpec::DEFAULT_SIZE,
        };

        let sentry = var("SENTRY_DSN").map(|dsn| SentryConfig {
            dsn: SecretString::from(dsn),
            environment: var("SENTRY_ENVIRONMENT"),
            sample_rate: var("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        });

        let mut config = Self {
            api_url,
            endpoints,
            page_size,
            state_file: PathBuf::from(or_default("LITTLE_SUN_STATE_FILE", DEFAULT_STATE_FILE)),
            env_name: or_default("LITTLE_SUN_ENV", DEFAULT_ENV_NAME),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            log_json: false,
            sentry,
        };
        config.log_json = match var("LITTLE_SUN_LOG_JSON") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| ConfigError::InvalidEnvVar("LITTLE_SUN_LOG_JSON".to_string(), raw))?,
            // Production logs go to a log shipper
            None => config.is_production(),
        };
        Ok(config)
    }

    /// Configuration pointing at `api_url` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not an absolute http(s) URL.
    pub fn for_api(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = api_url.to_string();
        Self::from_lookup(move |key| (key == "LITTLE_SUN_API_URL").then(|| api_url.clone()))
    }

    /// File holding the backend session cookie, next to the state file.
    #[must_use]
    pub fn cookie_file(&self) -> PathBuf {
        self.state_file.with_extension("cookies.json")
    }

    /// Whether this is a production deployment.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.env_name.eq_ignore_ascii_case("production")
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("LITTLE_SUN_API_URL".to_string(), reason);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}
