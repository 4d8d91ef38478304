//! Application state shared by the binaries.
//!
//! Wires one [`SessionStore`] through every component: the backend client
//! reads the access token from it, [`Auth`] publishes to it, and the session
//! guard subscribes to it through [`Auth`].

use std::sync::Arc;

use crate::backend::BackendClient;
use crate::cart::{CartStore, RemoteCart};
use crate::config::AdminConfig;
use crate::error::AppError;
use crate::guard::{Navigator, SessionGuard};
use crate::repo::ProfileRepository;
use crate::services::{Auth, CatalogService, OrderService};
use crate::session::{SessionSource, SessionStore};

/// Application state.
///
/// Cheap to clone; all clones share the same session and cart.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    auth: Auth,
    profiles: ProfileRepository,
    cart: CartStore,
    catalog: CatalogService,
    orders: OrderService,
}

impl AppState {
    /// Build the state from configuration. Does not touch the network.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, AppError> {
        let client = BackendClient::new(&config, SessionStore::new())?;
        let auth = Auth::new(client.clone());
        let sessions: Arc<dyn SessionSource> = Arc::new(auth.clone());

        let cart = CartStore::new(Arc::new(RemoteCart::new(
            Arc::clone(&sessions),
            client.clone(),
        )));
        let catalog = CatalogService::new(
            client.clone(),
            Arc::clone(&sessions),
            config.category_cache_ttl,
        );
        let orders = OrderService::new(client.clone(), sessions);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                profiles: ProfileRepository::new(client),
                cart,
                catalog,
                orders,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn auth(&self) -> &Auth {
        &self.inner.auth
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        self.inner.auth.sessions()
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// A guard over the dashboard driving `navigator`. Call
    /// [`SessionGuard::mount`] to start it.
    #[must_use]
    pub fn session_guard(&self, navigator: Arc<dyn Navigator>) -> SessionGuard {
        SessionGuard::new(
            Arc::new(self.inner.auth.clone()),
            Arc::new(self.inner.profiles.clone()),
            navigator,
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("sessions", self.sessions())
            .finish_non_exhaustive()
    }
}
