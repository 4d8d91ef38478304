//! Command implementations.
//!
//! Each command runs inside a [`DashboardSession`]: signed in, and admitted by
//! the session guard.

use std::sync::Arc;

use tracing::{debug, info};

use vendor_dash_admin::config::AdminConfig;
use vendor_dash_admin::error::AppError;
use vendor_dash_admin::guard::{GuardHandle, GuardView, TracingNavigator};
use vendor_dash_admin::state::AppState;

pub mod cart;
pub mod catalog;
pub mod orders;

/// A signed-in session that passed the guard.
pub struct DashboardSession {
    state: AppState,
    guard: GuardHandle,
}

impl DashboardSession {
    /// Sign in with the configured credentials and wait for the guard.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when no credentials are configured,
    /// `AppError::Auth` when sign-in fails, and `AppError::Denied` when the
    /// guard lands on the login view.
    pub async fn open(config: AdminConfig) -> Result<Self, AppError> {
        let credentials = config.credentials.clone().ok_or_else(|| {
            AppError::BadRequest(
                "VENDOR_DASH_EMAIL and VENDOR_DASH_PASSWORD must be set".to_string(),
            )
        })?;

        let state = AppState::new(config)?;
        state
            .auth()
            .sign_in_with_password(credentials.email.as_str(), &credentials.password)
            .await?;

        let guard = state.session_guard(Arc::new(TracingNavigator)).mount();
        match guard.settled().await {
            Some(GuardView::Protected(admin)) => {
                debug!(user_id = %admin.user_id, "Session admitted");
                Ok(Self { state, guard })
            }
            Some(GuardView::Login(denial)) => {
                guard.unmount().await;
                state.auth().sign_out().await;
                Err(AppError::Denied(denial))
            }
            Some(GuardView::Blank) | None => {
                guard.unmount().await;
                state.auth().sign_out().await;
                Err(AppError::Internal(
                    "session guard stopped before resolving".to_string(),
                ))
            }
        }
    }

    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Unmount the guard and sign out.
    pub async fn close(self) {
        self.guard.unmount().await;
        self.state.auth().sign_out().await;
        info!("Signed out");
    }
}
