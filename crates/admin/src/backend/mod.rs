//! Client for the hosted backend (auth + row storage).
//!
//! # Architecture
//!
//! The backend exposes two HTTP surfaces under one base URL:
//!
//! - `/auth/v1/*` - password sign-in, token refresh, sign-out
//! - `/rest/v1/{collection}` - row storage with filters, ordering and joins
//!
//! Every request carries the project's anon key in the `apikey` header. When
//! a [`Session`](crate::models::Session) is present in the shared
//! [`SessionStore`], REST calls are authorized with its access token so that
//! row-level security applies to the signed-in vendor.
//!
//! # Example
//!
//! ```rust,ignore
//! use vendor_dash_admin::backend::BackendClient;
//!
//! let client = BackendClient::new(&config, sessions.clone())?;
//!
//! let categories: Vec<CategoryRow> = client
//!     .from("categories")
//!     .select("id,name,image,desc")
//!     .order("name", true)
//!     .fetch_all()
//!     .await?;
//! ```

mod auth;
mod query;

pub use auth::{AuthUser, TokenResponse};
pub use query::Query;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::config::AdminConfig;
use crate::session::SessionStore;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Credentials or token rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No row matched a single-row request.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Building the request failed before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Backend API client.
///
/// Cheap to clone; all clones share one connection pool and one session store.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    sessions: SessionStore,
}

impl BackendClient {
    /// Create a new backend client bound to a session store.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &AdminConfig, sessions: SessionStore) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(config.anon_key.expose_secret())
            .map_err(|e| BackendError::InvalidRequest(format!("invalid anon key: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.backend_url.clone(),
                anon_key: config.anon_key.clone(),
                sessions,
            }),
        })
    }

    /// The session store whose token authorizes REST calls.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Start a query against a named collection.
    #[must_use]
    pub fn from(&self, collection: &str) -> Query {
        Query::new(self.clone(), collection)
    }

    /// Absolute URL for a path below the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::InvalidRequest(format!("bad path {path}: {e}")))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Bearer value for REST calls: the session token, or the anon key.
    pub(crate) fn bearer(&self) -> Result<HeaderValue, BackendError> {
        let token = self.inner.sessions.current().map_or_else(
            || self.inner.anon_key.expose_secret().to_owned(),
            |s| s.access_token.expose_secret().to_owned(),
        );
        bearer_header(&token)
    }

    /// Attach the REST authorization header to a request.
    pub(crate) fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, BackendError> {
        Ok(request.header(AUTHORIZATION, self.bearer()?))
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Build an `Authorization: Bearer` header marked sensitive.
pub(crate) fn bearer_header(token: &str) -> Result<HeaderValue, BackendError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| BackendError::InvalidRequest(format!("invalid token: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Decode a successful response body, or turn an error status into
/// a [`BackendError`].
pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    if response.status().is_success() {
        let body = response.text().await?;
        return serde_json::from_str(&body)
            .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")));
    }
    Err(parse_error(response).await)
}

/// Accept any success status and discard the body.
pub(crate) async fn handle_empty_response(response: reqwest::Response) -> Result<(), BackendError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(parse_error(response).await)
}

/// Parse an error response from the backend.
async fn parse_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return BackendError::RateLimited(retry_after);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    classify_error(status, &body)
}

/// Map a status code and body to an error variant.
///
/// `406` is what the REST surface answers when a single-row request matched
/// zero (or several) rows.
fn classify_error(status: u16, body: &str) -> BackendError {
    let message = extract_message(body);
    match status {
        401 | 403 => BackendError::Unauthorized(message),
        404 | 406 => BackendError::NotFound(message),
        _ => BackendError::Api { status, message },
    }
}

/// Pull a human-readable message out of an error body.
///
/// REST errors use `message`; auth errors use `error_description`, `msg` or
/// `error`. Anything else is returned as-is.
fn extract_message(body: &str) -> String {
    let trimmed = body.trim();
    let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return if trimmed.is_empty() {
            "Unknown error".to_string()
        } else {
            trimmed.to_string()
        };
    };

    ["message", "error_description", "msg", "error"]
        .iter()
        .find_map(|key| json.get(key).and_then(serde_json::Value::as_str))
        .map_or_else(|| trimmed.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_rest_error() {
        let body = r#"{"code":"PGRST116","details":"0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert_eq!(
            extract_message(body),
            "JSON object requested, multiple (or no) rows returned"
        );
    }

    #[test]
    fn test_extract_message_auth_error() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(extract_message(body), "Invalid login credentials");
    }

    #[test]
    fn test_extract_message_plain_text() {
        assert_eq!(extract_message("upstream timeout"), "upstream timeout");
        assert_eq!(extract_message("  "), "Unknown error");
    }

    #[test]
    fn test_classify_error() {
        assert!(matches!(
            classify_error(401, r#"{"msg":"JWT expired"}"#),
            BackendError::Unauthorized(m) if m == "JWT expired"
        ));
        assert!(matches!(
            classify_error(406, "{}"),
            BackendError::NotFound(_)
        ));
        assert!(matches!(
            classify_error(409, r#"{"message":"duplicate key"}"#),
            BackendError::Api { status: 409, .. }
        ));
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Api {
            status: 503,
            message: "network down".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - network down");
    }
}
