//! Scenario tests for the vendor dashboard.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vendor-dash-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `guard_scenarios` - session guard against a live [`SessionStore`]
//! - `cart_store` - cart store against an in-memory cart backend
//!
//! Everything here runs in memory. The fakes in this crate stand in for the
//! backend traits so that no test needs the network.
//!
//! [`SessionStore`]: vendor_dash_admin::session::SessionStore

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::SecretString;
use tokio::sync::Notify;
use uuid::Uuid;

use vendor_dash_admin::backend::BackendError;
use vendor_dash_admin::cart::CartBackend;
use vendor_dash_admin::guard::{Navigator, RoleLookup, RoleLookupError, Route};
use vendor_dash_admin::models::Session;
use vendor_dash_admin::repo::RepositoryError;
use vendor_dash_core::{CartItem, CartItemId, ProductId, Quantity, Role, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A fresh one-hour session for `user`.
#[must_use]
pub fn session(user: &str) -> Session {
    Session {
        access_token: SecretString::from(format!("at-{user}")),
        refresh_token: SecretString::from(format!("rt-{user}")),
        user_id: UserId::new(user),
        email: Some(format!("{user}@shop.in")),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// Error shaped like a failed backend call.
#[must_use]
pub fn backend_failure(message: &str) -> RepositoryError {
    RepositoryError::Backend(BackendError::Api {
        status: 503,
        message: message.to_owned(),
    })
}

// =============================================================================
// Profiles
// =============================================================================

/// In-memory `profiles` collection.
///
/// Users without a row fail the lookup with `ProfileMissing`. A user can be
/// marked slow: the lookup then parks until [`MemoryProfiles::release`].
#[derive(Default)]
pub struct MemoryProfiles {
    roles: Mutex<HashMap<UserId, String>>,
    slow: Mutex<Option<UserId>>,
    lookups: Mutex<Vec<UserId>>,
    entered: Notify,
    released: Notify,
}

impl MemoryProfiles {
    #[must_use]
    pub fn with_roles(pairs: &[(&str, &str)]) -> Self {
        let profiles = Self::default();
        for (user, role) in pairs {
            profiles.set_role(user, role);
        }
        profiles
    }

    pub fn set_role(&self, user: &str, role: &str) {
        lock(&self.roles).insert(UserId::new(user), role.to_owned());
    }

    /// Park lookups for `user` until released.
    pub fn make_slow(&self, user: &str) {
        *lock(&self.slow) = Some(UserId::new(user));
    }

    /// Wait until a slow lookup is parked.
    pub async fn wait_until_parked(&self) {
        self.entered.notified().await;
    }

    /// Let parked lookups continue.
    pub fn release(&self) {
        self.released.notify_waiters();
    }

    /// Users looked up so far, in call order.
    #[must_use]
    pub fn lookups(&self) -> Vec<UserId> {
        lock(&self.lookups).clone()
    }
}

#[async_trait]
impl RoleLookup for MemoryProfiles {
    async fn get_role(&self, user_id: &UserId) -> Result<Role, RoleLookupError> {
        lock(&self.lookups).push(user_id.clone());

        let is_slow = lock(&self.slow).as_ref() == Some(user_id);
        if is_slow {
            let released = self.released.notified();
            self.entered.notify_one();
            released.await;
        }

        let role = lock(&self.roles)
            .get(user_id)
            .cloned()
            .ok_or_else(|| RoleLookupError::ProfileMissing(user_id.clone()))?;
        Ok(Role::parse(&role)?)
    }
}

// =============================================================================
// Navigation
// =============================================================================

/// Navigator that records every route it is sent to.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        lock(&self.routes).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn goto(&self, route: Route) {
        lock(&self.routes).push(route);
    }
}

// =============================================================================
// Cart
// =============================================================================

/// In-memory `cart_items` collection for one user.
///
/// Adds upsert on the product and set the quantity. Failures can be queued
/// with [`MemoryCart::fail_next`], and calls can be held at a gate with
/// [`MemoryCart::hold_next`] so tests decide the order in which they settle.
#[derive(Default)]
pub struct MemoryCart {
    lines: Mutex<Vec<CartItem>>,
    failures: Mutex<VecDeque<String>>,
    gates: Mutex<VecDeque<Arc<Notify>>>,
    calls: Mutex<usize>,
}

impl MemoryCart {
    #[must_use]
    pub fn with_lines(lines: Vec<CartItem>) -> Self {
        Self {
            lines: Mutex::new(lines),
            ..Self::default()
        }
    }

    /// Server-side lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartItem> {
        lock(&self.lines).clone()
    }

    /// Number of backend calls made.
    #[must_use]
    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }

    /// Fail the next call with `message`.
    pub fn fail_next(&self, message: &str) {
        lock(&self.failures).push_back(message.to_owned());
    }

    /// Hold the next call until the returned gate is notified.
    #[must_use]
    pub fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.gates).push_back(Arc::clone(&gate));
        gate
    }

    async fn enter(&self) -> Result<(), RepositoryError> {
        *lock(&self.calls) += 1;
        let gate = lock(&self.gates).pop_front();
        let failure = lock(&self.failures).pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        failure.map_or(Ok(()), |message| Err(backend_failure(&message)))
    }
}

#[async_trait]
impl CartBackend for MemoryCart {
    async fn fetch_all(&self) -> Result<Vec<CartItem>, RepositoryError> {
        self.enter().await?;
        Ok(self.lines())
    }

    async fn add(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        self.enter().await?;
        let mut lines = lock(&self.lines);
        if let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = quantity;
            return Ok(line.clone());
        }
        let line = CartItem::new(Uuid::new_v4().to_string(), product_id.clone(), quantity);
        lines.push(line.clone());
        Ok(line)
    }

    async fn update_quantity(
        &self,
        id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        self.enter().await?;
        let mut lines = lock(&self.lines);
        let line = lines
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or(RepositoryError::NotFound)?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn remove(&self, id: &CartItemId) -> Result<(), RepositoryError> {
        self.enter().await?;
        lock(&self.lines).retain(|l| &l.id != id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        self.enter().await?;
        lock(&self.lines).clear();
        Ok(())
    }
}
