//! Vendor dashboard - headless admin session.
//!
//! Signs in with the configured credentials (if any), mounts the session
//! guard in front of the dashboard, and keeps the cart in sync with the
//! guard's view until Ctrl+C or SIGTERM. On shutdown the guard is unmounted
//! and the session is signed out.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use tracing::{debug, info, warn};

use vendor_dash_admin::config::AdminConfig;
use vendor_dash_admin::error::{AppError, clear_sentry_user, set_sentry_user};
use vendor_dash_admin::guard::{GuardView, TracingNavigator};
use vendor_dash_admin::state::AppState;
use vendor_dash_admin::telemetry;

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = AdminConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing("vendor_dash_admin=info", config.log_json);

    let state = AppState::new(config).expect("Failed to create application state");

    if let Err(e) = run(state).await {
        e.report();
        let code = e.exit_code();
        // Flush Sentry before exiting.
        drop(sentry_guard);
        std::process::exit(code);
    }
}

async fn run(state: AppState) -> Result<(), AppError> {
    if let Some(credentials) = state.config().credentials.clone() {
        state
            .auth()
            .sign_in_with_password(credentials.email.as_str(), &credentials.password)
            .await?;
    } else {
        info!("No credentials configured, waiting for a session");
    }

    let guard = state.session_guard(Arc::new(TracingNavigator)).mount();
    let mut views = guard.subscribe();
    let initial = views.borrow_and_update().clone();
    on_view(&state, &initial).await;

    let shutdown = telemetry::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = views.changed() => {
                if changed.is_err() {
                    warn!("Session guard stopped");
                    break;
                }
                let view = views.borrow_and_update().clone();
                on_view(&state, &view).await;
            }
        }
    }

    guard.unmount().await;
    state.auth().sign_out().await;
    clear_sentry_user();
    Ok(())
}

/// React to a guard view change.
async fn on_view(state: &AppState, view: &GuardView) {
    match view {
        GuardView::Blank => debug!("Resolving session"),
        GuardView::Protected(admin) => {
            set_sentry_user(&admin.user_id, admin.email.as_deref());
            info!(user_id = %admin.user_id, "Dashboard unlocked");
            match state.cart().fetch_all().await {
                Ok(items) => info!(items = items.len(), "Cart loaded"),
                Err(e) => warn!(error = %e, "Cart could not be loaded"),
            }
        }
        GuardView::Login(denial) => {
            clear_sentry_user();
            state.cart().reset();
            info!(reason = denial.kind(), "Showing login");
        }
    }
}
