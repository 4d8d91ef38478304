//! Password authentication against the hosted backend.
//!
//! [`Auth`] owns the transitions of the shared [`SessionStore`]: every
//! sign-in, refresh and sign-out is published there as an [`AuthEvent`].

mod error;

pub use error::AuthError;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use vendor_dash_core::Email;

use crate::backend::BackendClient;
use crate::models::Session;
use crate::session::{AuthEvent, SessionSource, SessionStore, SessionSubscription};

/// Authentication service.
///
/// Cheap to clone; clones share the session store and the refresh lock.
#[derive(Clone)]
pub struct Auth {
    client: BackendClient,
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Auth {
    /// Create an auth service publishing to the client's session store.
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// The session store this service publishes to.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        self.client.sessions()
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    /// Returns `AuthError::InvalidCredentials` if the backend rejects them.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;
        let tokens = self
            .client
            .password_grant(&email, password)
            .await
            .map_err(AuthError::from_grant)?;
        let session = tokens.into_session(Utc::now());

        info!(user_id = %session.user_id, "signed in");
        self.sessions().publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// End the session.
    ///
    /// The local session is always cleared. A failure to revoke the token on
    /// the backend is logged and otherwise ignored.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let Some(session) = self.sessions().current() else {
            return;
        };

        self.sessions().publish(AuthEvent::SignedOut);
        if let Err(e) = self.client.logout(&session.access_token).await {
            warn!(user_id = %session.user_id, error = %e, "token revocation failed");
        }
        info!(user_id = %session.user_id, "signed out");
    }

    /// Exchange the refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` if there is no session.
    /// Returns `AuthError::SessionExpired` if the refresh token was rejected;
    /// the session is cleared in that case.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Session, AuthError> {
        let current = self.sessions().current().ok_or(AuthError::NotSignedIn)?;

        match self.client.refresh_grant(&current.refresh_token).await {
            Ok(tokens) => {
                let session = tokens.into_session(Utc::now());
                info!(user_id = %session.user_id, "token refreshed");
                self.sessions()
                    .publish(AuthEvent::TokenRefreshed(session.clone()));
                Ok(session)
            }
            Err(e) => {
                warn!(user_id = %current.user_id, error = %e, "token refresh failed, signing out");
                self.sessions().publish(AuthEvent::SignedOut);
                Err(AuthError::SessionExpired)
            }
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("sessions", self.sessions())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionSource for Auth {
    /// The current session, refreshed first if its token has expired.
    async fn get_session(&self) -> Option<Session> {
        let session = self.sessions().current()?;
        if !session.is_expired() {
            return Some(session);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while this one waited.
        match self.sessions().current() {
            Some(session) if !session.is_expired() => Some(session),
            Some(_) => self.refresh().await.ok(),
            None => None,
        }
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.sessions().subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use vendor_dash_core::UserId;

    use super::*;
    use crate::config::AdminConfig;

    /// Auth pointed at a closed local port, so any network call fails fast.
    fn offline_auth() -> Auth {
        let config = AdminConfig::for_tests("http://127.0.0.1:9/");
        Auth::new(BackendClient::new(&config, SessionStore::new()).unwrap())
    }

    fn session(expires_in: Duration) -> Session {
        Session {
            access_token: SecretString::from("at"),
            refresh_token: SecretString::from("rt"),
            user_id: UserId::new("u1"),
            email: None,
            expires_at: Utc::now() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_invalid_email_rejected_locally() {
        let auth = offline_auth();
        let err = auth
            .sign_in_with_password("not-an-email", &SecretString::from("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_fresh_session_returned_without_refresh() {
        let auth = offline_auth();
        auth.sessions()
            .publish(AuthEvent::SignedIn(session(Duration::hours(1))));

        let current = auth.get_session().await.unwrap();
        assert_eq!(current.user_id.as_str(), "u1");
    }

    #[tokio::test]
    async fn test_failed_refresh_signs_out() {
        let auth = offline_auth();
        auth.sessions()
            .publish(AuthEvent::SignedIn(session(Duration::seconds(-5))));
        let mut events = auth.on_session_change();

        assert!(auth.get_session().await.is_none());
        assert!(auth.sessions().current().is_none());
        assert!(matches!(events.recv().await, Some(AuthEvent::SignedOut)));
    }

    #[tokio::test]
    async fn test_refresh_without_session() {
        let auth = offline_auth();
        assert!(matches!(auth.refresh().await, Err(AuthError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_sign_out_clears_locally_even_if_revocation_fails() {
        let auth = offline_auth();
        auth.sessions()
            .publish(AuthEvent::SignedIn(session(Duration::hours(1))));

        auth.sign_out().await;
        assert!(auth.sessions().current().is_none());
    }

    #[test]
    fn test_grant_rejection_is_invalid_credentials() {
        let err = AuthError::from_grant(crate::backend::BackendError::Api {
            status: 400,
            message: "Invalid login credentials".to_owned(),
        });
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
