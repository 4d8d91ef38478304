//! Session guard for the protected dashboard area.
//!
//! On mount, and again on every session-change notification, the guard runs a
//! resolution cycle:
//!
//! 1. Publish [`GuardView::Blank`] so nothing is rendered while deciding.
//! 2. Read the current session. None means [`Denial::AuthAbsent`].
//! 3. Look up the user's role. Only `admin` is let through; any other role,
//!    or a failed lookup, is [`Denial::AuthUnauthorized`].
//! 4. Publish the outcome and navigate to its route if that differs from the
//!    route the guard last navigated to.
//!
//! A new notification cancels the cycle in flight, so a slow lookup can never
//! overwrite the outcome of a newer one. Unmounting cancels the cycle and
//! releases the session subscription; nothing is published or navigated
//! afterwards.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vendor_dash_core::{Role, RoleError, UserId};

use crate::repo::RepositoryError;
use crate::session::{SessionSource, SessionSubscription};

/// Dashboard routes the guard navigates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    /// URL path of the route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Routing surface the guard drives.
pub trait Navigator: Send + Sync {
    fn goto(&self, route: Route);
}

/// Navigator for headless runs: records the navigation in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn goto(&self, route: Route) {
        info!(route = %route, "navigate");
    }
}

/// Why a signed-in user was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// The profile carries a role other than `admin`.
    NotAdmin(Role),
    /// The role could not be determined.
    RoleUnresolved(String),
}

/// Why the login view is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// No session.
    AuthAbsent,
    /// Session present but not an admin.
    AuthUnauthorized(UnauthorizedReason),
}

impl Denial {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AuthAbsent => "auth_absent",
            Self::AuthUnauthorized(UnauthorizedReason::NotAdmin(_)) => "not_admin",
            Self::AuthUnauthorized(UnauthorizedReason::RoleUnresolved(_)) => "role_unresolved",
        }
    }
}

/// A signed-in user confirmed to hold the `admin` role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedAdmin {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// What the guarded area renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GuardView {
    /// A resolution cycle is running.
    #[default]
    Blank,
    Login(Denial),
    Protected(AuthorizedAdmin),
}

impl GuardView {
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Route this view belongs to; `None` while blank.
    #[must_use]
    pub const fn route(&self) -> Option<Route> {
        match self {
            Self::Blank => None,
            Self::Login(_) => Some(Route::Login),
            Self::Protected(_) => Some(Route::Dashboard),
        }
    }

    /// The authorized admin, when the protected area is shown.
    #[must_use]
    pub const fn admin(&self) -> Option<&AuthorizedAdmin> {
        match self {
            Self::Protected(admin) => Some(admin),
            _ => None,
        }
    }
}

/// Errors from looking up a user's role.
#[derive(Debug, Error)]
pub enum RoleLookupError {
    #[error("no profile for user {0}")]
    ProfileMissing(UserId),

    #[error("invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Role lookup by user id.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn get_role(&self, user_id: &UserId) -> Result<Role, RoleLookupError>;
}

/// Outcome of one resolution cycle.
struct Resolution {
    generation: u64,
    view: GuardView,
}

type Cycle = Pin<Box<dyn Future<Output = Resolution> + Send>>;

/// Gate in front of the protected area.
#[derive(Clone)]
pub struct SessionGuard {
    sessions: Arc<dyn SessionSource>,
    roles: Arc<dyn RoleLookup>,
    navigator: Arc<dyn Navigator>,
}

impl SessionGuard {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionSource>,
        roles: Arc<dyn RoleLookup>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            sessions,
            roles,
            navigator,
        }
    }

    /// Start guarding. Must be called inside a tokio runtime.
    ///
    /// The session subscription is registered before this returns, so no
    /// notification published afterwards is missed.
    #[must_use]
    pub fn mount(self) -> GuardHandle {
        let subscription = self.sessions.on_session_change();
        let (view_tx, view_rx) = watch::channel(GuardView::Blank);
        let task = tokio::spawn(self.run(subscription, view_tx));

        GuardHandle {
            view: view_rx,
            task: Some(task),
        }
    }

    async fn run(self, mut subscription: SessionSubscription, view: watch::Sender<GuardView>) {
        let mut generation = 0_u64;
        let mut last_route: Option<Route> = None;
        let mut cycle: Cycle = Box::pin(self.clone().resolve(generation));
        let mut pending = true;

        loop {
            tokio::select! {
                biased;

                event = subscription.recv() => {
                    let Some(event) = event else {
                        // Session store is gone; finish the current cycle and stop.
                        if pending {
                            let resolution = (&mut cycle).await;
                            self.apply(resolution, generation, &mut last_route, &view);
                        }
                        break;
                    };
                    generation += 1;
                    debug!(event = event.kind(), generation, "session changed, re-resolving");
                    view.send_replace(GuardView::Blank);
                    cycle = Box::pin(self.clone().resolve(generation));
                    pending = true;
                }

                resolution = &mut cycle, if pending => {
                    pending = false;
                    self.apply(resolution, generation, &mut last_route, &view);
                }
            }
        }
    }

    async fn resolve(self, generation: u64) -> Resolution {
        let Some(session) = self.sessions.get_session().await else {
            info!(generation, "no session, showing login");
            return Resolution {
                generation,
                view: GuardView::Login(Denial::AuthAbsent),
            };
        };

        let user_id = session.user_id;
        let view = match self.roles.get_role(&user_id).await {
            Ok(role) if role.is_admin() => {
                info!(user_id = %user_id, generation, "admin authorized");
                GuardView::Protected(AuthorizedAdmin {
                    user_id,
                    email: session.email,
                })
            }
            Ok(role) => {
                warn!(user_id = %user_id, generation, reason = "not_admin", role = role.as_str(), "user is not an admin");
                GuardView::Login(Denial::AuthUnauthorized(UnauthorizedReason::NotAdmin(role)))
            }
            Err(e) => {
                warn!(user_id = %user_id, generation, reason = "role_unresolved", error = %e, "role lookup failed");
                GuardView::Login(Denial::AuthUnauthorized(UnauthorizedReason::RoleUnresolved(
                    e.to_string(),
                )))
            }
        };

        Resolution { generation, view }
    }

    fn apply(
        &self,
        resolution: Resolution,
        current: u64,
        last_route: &mut Option<Route>,
        view: &watch::Sender<GuardView>,
    ) {
        if resolution.generation != current {
            debug!(
                stale = resolution.generation,
                current, "discarding stale resolution"
            );
            return;
        }

        let route = resolution.view.route();
        view.send_replace(resolution.view);
        if route.is_some() && route != *last_route {
            *last_route = route;
            if let Some(route) = route {
                self.navigator.goto(route);
            }
        }
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard").finish_non_exhaustive()
    }
}

/// A mounted guard. Dropping it aborts the guard task.
#[derive(Debug)]
pub struct GuardHandle {
    view: watch::Receiver<GuardView>,
    task: Option<JoinHandle<()>>,
}

impl GuardHandle {
    /// The view currently rendered.
    #[must_use]
    pub fn view(&self) -> GuardView {
        self.view.borrow().clone()
    }

    /// A receiver that observes every published view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GuardView> {
        self.view.clone()
    }

    /// Wait until the view satisfies `predicate`.
    ///
    /// Returns `None` if the guard stopped first.
    pub async fn wait_for<F>(&self, predicate: F) -> Option<GuardView>
    where
        F: FnMut(&GuardView) -> bool,
    {
        let mut rx = self.view.clone();
        rx.wait_for(predicate).await.ok().map(|view| view.clone())
    }

    /// Wait until a resolution cycle has completed.
    pub async fn settled(&self) -> Option<GuardView> {
        self.wait_for(|view| !view.is_blank()).await
    }

    /// Stop guarding and release the session subscription.
    ///
    /// When this returns, no further navigation or view change can happen.
    pub async fn unmount(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // The result is either Ok(()) or a cancellation.
            let _ = task.await;
        }
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
