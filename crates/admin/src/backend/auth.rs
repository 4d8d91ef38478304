//! Auth surface: password grant, refresh grant and logout.

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vendor_dash_core::{Email, UserId};

use super::{BackendClient, BackendError, bearer_header, handle_empty_response, handle_response};
use crate::models::Session;

/// Lifetime assumed when the token response carries no expiry at all.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// User record embedded in a token response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Successful response from the token endpoint.
#[derive(Deserialize)]
pub struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    expires_at: Option<i64>,
    pub user: AuthUser,
}

impl TokenResponse {
    /// Convert into a [`Session`], resolving the expiry against `now`.
    #[must_use]
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .or_else(|| {
                self.expires_in
                    .and_then(|secs| expiry_after(now, secs))
                    .or_else(|| expiry_after(now, DEFAULT_TOKEN_LIFETIME_SECONDS))
            })
            .unwrap_or(now);

        Session {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            user_id: self.user.id,
            email: self.user.email,
            expires_at,
        }
    }
}

/// `now + secs`, or `None` when the result is out of range.
fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(secs).and_then(|lifetime| now.checked_add_signed(lifetime))
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

impl BackendClient {
    /// Exchange email and password for tokens.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` (status 400) for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn password_grant(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<TokenResponse, BackendError> {
        let url = self.url("auth/v1/token?grant_type=password")?;
        let body = PasswordGrant {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response = self.http().post(url).json(&body).send().await?;
        handle_response(response).await
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the refresh token was revoked or expired.
    #[instrument(skip_all)]
    pub async fn refresh_grant(
        &self,
        refresh_token: &SecretString,
    ) -> Result<TokenResponse, BackendError> {
        let url = self.url("auth/v1/token?grant_type=refresh_token")?;
        let body = RefreshGrant {
            refresh_token: refresh_token.expose_secret(),
        };
        let response = self.http().post(url).json(&body).send().await?;
        handle_response(response).await
    }

    /// Revoke the session identified by `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects the logout.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &SecretString) -> Result<(), BackendError> {
        let url = self.url("auth/v1/logout")?;
        let response = self
            .http()
            .post(url)
            .header(AUTHORIZATION, bearer_header(access_token.expose_secret())?)
            .send()
            .await?;
        handle_empty_response(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_into_session_prefers_absolute_expiry() {
        let body = r#"{
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "expires_at": 1772370000,
            "user": {"id": "5d1e7f0a-0000-4000-8000-000000000001", "email": "ops@shop.in"}
        }"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        let session = token.into_session(now());

        assert_eq!(session.expires_at.timestamp(), 1_772_370_000);
        assert_eq!(session.user_id.as_str(), "5d1e7f0a-0000-4000-8000-000000000001");
        assert_eq!(session.email.as_deref(), Some("ops@shop.in"));
        assert_eq!(session.access_token.expose_secret(), "at");
    }

    #[test]
    fn test_into_session_falls_back_to_relative_expiry() {
        let body = r#"{"access_token":"at","refresh_token":"rt","expires_in":60,"user":{"id":"u1"}}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        let session = token.into_session(now());
        assert_eq!(session.expires_at, now() + Duration::seconds(60));
        assert!(session.email.is_none());
    }

    #[test]
    fn test_into_session_out_of_range_lifetime_uses_default() {
        let body = r#"{"access_token":"at","refresh_token":"rt","expires_in":9223372036854775807,"user":{"id":"u1"}}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        let session = token.into_session(now());
        assert_eq!(
            session.expires_at,
            now() + Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS)
        );
    }

    #[test]
    fn test_into_session_missing_expiry_uses_default() {
        let body = r#"{"access_token":"at","refresh_token":"rt","user":{"id":"u1"}}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        let session = token.into_session(now());
        assert_eq!(session.expires_at, now() + Duration::hours(1));
    }

    #[test]
    fn test_token_response_debug_redacts() {
        let body = r#"{"access_token":"very-secret-at","refresh_token":"very-secret-rt","user":{"id":"u1"}}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_token_response_requires_user() {
        let body = r#"{"access_token":"at","refresh_token":"rt"}"#;
        assert!(serde_json::from_str::<TokenResponse>(body).is_err());
    }
}
