//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during sign-in, refresh and sign-out.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] vendor_dash_core::EmailError),

    /// Email and password did not match.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The operation needs a session and there is none.
    #[error("not signed in")]
    NotSignedIn,

    /// The refresh token was rejected; the session has been cleared.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// Backend call failed.
    #[error("auth backend error: {0}")]
    Backend(#[from] BackendError),
}

impl AuthError {
    /// Map a token-endpoint failure, treating rejections as bad credentials.
    pub(super) fn from_grant(error: BackendError) -> Self {
        match error {
            BackendError::Unauthorized(_) | BackendError::Api { status: 400, .. } => {
                Self::InvalidCredentials
            }
            other => Self::Backend(other),
        }
    }
}
