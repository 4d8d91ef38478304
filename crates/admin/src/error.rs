//! Unified error handling for the dashboard binaries.

use thiserror::Error;

use vendor_dash_core::UserId;

use crate::backend::BackendError;
use crate::cart::CartError;
use crate::config::ConfigError;
use crate::guard::Denial;
use crate::repo::RepositoryError;
use crate::services::AuthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend client failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Sign-in, refresh or sign-out failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// A cart operation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The session guard sent the user to the login view.
    #[error("Access denied: {}", .0.kind())]
    Denied(Denial),

    /// Bad input from the command line.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error points at a fault on our side or the backend's,
    /// rather than at the user's input or permissions.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Repository(_) | Self::Internal(_)
        )
    }

    /// Log the error, sending server-side classes to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Dashboard error"
            );
        } else {
            tracing::warn!(error = %self, "Dashboard error");
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::BadRequest(_) => 2,
            Self::Denied(_) | Self::Auth(AuthError::InvalidCredentials) => 3,
            _ => 1,
        }
    }
}

/// Set the Sentry user context for the signed-in user.
pub fn set_sentry_user(user_id: &UserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartOperation;
    use crate::guard::UnauthorizedReason;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("quantity must be positive".to_string());
        assert_eq!(err.to_string(), "Bad request: quantity must be positive");

        let err = AppError::Denied(Denial::AuthUnauthorized(UnauthorizedReason::RoleUnresolved(
            "no profile".to_string(),
        )));
        assert_eq!(err.to_string(), "Access denied: role_unresolved");

        let err = AppError::from(CartError {
            operation: CartOperation::Add,
            message: "Failed to add item".to_string(),
        });
        assert_eq!(err.to_string(), "Cart error: Failed to add item");
    }

    #[test]
    fn test_app_error_classes() {
        assert!(AppError::Internal("x".to_string()).is_server_error());
        assert!(AppError::Repository(RepositoryError::NotFound).is_server_error());
        assert!(!AppError::Denied(Denial::AuthAbsent).is_server_error());
        assert!(!AppError::Auth(AuthError::InvalidCredentials).is_server_error());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::BadRequest("x".to_string()).exit_code(), 2);
        assert_eq!(AppError::Denied(Denial::AuthAbsent).exit_code(), 3);
        assert_eq!(AppError::Internal("x".to_string()).exit_code(), 1);
    }
}
