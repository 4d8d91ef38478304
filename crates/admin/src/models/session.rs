//! Authenticated session held by the session store.

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;

use vendor_dash_core::UserId;

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN_SECONDS: i64 = 30;

/// An authenticated principal.
///
/// Tokens are wrapped in [`SecretString`] so they never show up in `Debug`
/// output or logs.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token for REST calls.
    pub access_token: SecretString,
    /// Token used to obtain a new access token.
    pub refresh_token: SecretString,
    /// Auth user the session belongs to; also the `profiles` key.
    pub user_id: UserId,
    /// Email on the auth user, if the backend returned one.
    pub email: Option<String>,
    /// When the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the access token is expired (or about to be) at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECONDS) >= self.expires_at
    }

    /// Whether the access token is expired (or about to be) right now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            access_token: SecretString::from("at"),
            refresh_token: SecretString::from("rt"),
            user_id: UserId::new("u1"),
            email: None,
            expires_at,
        }
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc::now();
        assert!(!session(now + Duration::minutes(5)).is_expired_at(now));
        assert!(session(now + Duration::seconds(10)).is_expired_at(now));
        assert!(session(now - Duration::seconds(1)).is_expired_at(now));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let debug = format!("{:?}", session(Utc::now()));
        assert!(!debug.contains("\"at\""));
        assert!(debug.contains("u1"));
    }
}
