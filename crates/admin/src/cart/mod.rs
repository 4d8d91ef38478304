//! Observable cart store.
//!
//! [`CartStore`] mirrors the signed-in user's cart. Each operation calls the
//! [`CartBackend`] and, once the call settles, patches the local item set with
//! what the backend returned:
//!
//! | Operation | On success |
//! |---|---|
//! | [`fetch_all`](CartStore::fetch_all) | replace the item set |
//! | [`add`](CartStore::add) | replace the line with the returned id, or append |
//! | [`update_quantity`](CartStore::update_quantity) | replace the matching line, if present |
//! | [`remove`](CartStore::remove) | drop the matching line |
//! | [`clear`](CartStore::clear) | empty the item set |
//!
//! A failed call never touches the item set; it only records the status and
//! the error message. Operations are not serialized against each other, so
//! racing calls settle in whatever order the backend answers.

mod remote;

pub use remote::RemoteCart;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use vendor_dash_core::{CartItem, CartItemId, CartStatus, ProductId, Quantity};

use crate::backend::BackendError;
use crate::repo::RepositoryError;

/// Remote cart persistence for the signed-in user.
#[async_trait]
pub trait CartBackend: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<CartItem>, RepositoryError>;

    /// Set the quantity for `product_id`, creating the line if needed.
    async fn add(&self, product_id: &ProductId, quantity: Quantity)
    -> Result<CartItem, RepositoryError>;

    async fn update_quantity(
        &self,
        id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError>;

    async fn remove(&self, id: &CartItemId) -> Result<(), RepositoryError>;

    async fn clear(&self) -> Result<(), RepositoryError>;
}

/// Cart operations, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    FetchAll,
    Add,
    UpdateQuantity,
    Remove,
    Clear,
}

impl CartOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchAll => "fetch_all",
            Self::Add => "add",
            Self::UpdateQuantity => "update_quantity",
            Self::Remove => "remove",
            Self::Clear => "clear",
        }
    }

    /// Message recorded when the failure carries none.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::FetchAll => "Failed to fetch cart",
            Self::Add => "Failed to add item",
            Self::UpdateQuantity => "Failed to update quantity",
            Self::Remove => "Failed to remove item",
            Self::Clear => "Failed to clear cart",
        }
    }
}

/// A rejected cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CartError {
    pub operation: CartOperation,
    pub message: String,
}

impl CartError {
    fn from_failure(operation: CartOperation, error: &RepositoryError) -> Self {
        let message = match error {
            RepositoryError::Backend(
                BackendError::Api { message, .. }
                | BackendError::Unauthorized(message)
                | BackendError::NotFound(message),
            ) => message.clone(),
            other => other.to_string(),
        };
        let message = if message.trim().is_empty() {
            operation.default_message().to_owned()
        } else {
            message
        };
        Self { operation, message }
    }
}

/// Snapshot of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub items: Vec<CartItem>,
    pub status: CartStatus,
    pub error: Option<String>,
}

/// Observable cart for the signed-in user.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct CartStore {
    backend: Arc<dyn CartBackend>,
    state: Arc<watch::Sender<CartState>>,
}

impl CartStore {
    #[must_use]
    pub fn new(backend: Arc<dyn CartBackend>) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            backend,
            state: Arc::new(state),
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Drop all local state without calling the backend.
    pub fn reset(&self) {
        self.state.send_replace(CartState::default());
    }

    /// Replace the item set with the backend's.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend rejects the call.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<CartItem>, CartError> {
        self.begin();
        let result = self.backend.fetch_all().await;
        self.settle(CartOperation::FetchAll, result, |items, fetched: &Vec<CartItem>| {
            items.clone_from(fetched);
        })
    }

    /// Set the quantity of `product_id` in the cart.
    ///
    /// The backend's line replaces any local line with the same id.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend rejects the call.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity.get()))]
    pub async fn add(&self, product_id: &ProductId, quantity: Quantity) -> Result<CartItem, CartError> {
        self.begin();
        let result = self.backend.add(product_id, quantity).await;
        self.settle(CartOperation::Add, result, |items, added: &CartItem| {
            match items.iter_mut().find(|item| item.id == added.id) {
                Some(existing) => existing.clone_from(added),
                None => items.push(added.clone()),
            }
        })
    }

    /// Change the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend rejects the call.
    #[instrument(skip(self), fields(cart_item_id = %id, quantity = quantity.get()))]
    pub async fn update_quantity(
        &self,
        id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, CartError> {
        self.begin();
        let result = self.backend.update_quantity(id, quantity).await;
        self.settle(CartOperation::UpdateQuantity, result, |items, updated: &CartItem| {
            if let Some(existing) = items.iter_mut().find(|item| item.id == updated.id) {
                existing.clone_from(updated);
            }
        })
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend rejects the call.
    #[instrument(skip(self), fields(cart_item_id = %id))]
    pub async fn remove(&self, id: &CartItemId) -> Result<(), CartError> {
        self.begin();
        let result = self.backend.remove(id).await;
        self.settle(CartOperation::Remove, result, |items, _: &()| {
            items.retain(|item| &item.id != id);
        })
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend rejects the call.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        self.begin();
        let result = self.backend.clear().await;
        self.settle(CartOperation::Clear, result, |items, _: &()| items.clear())
    }

    fn begin(&self) {
        self.state.send_modify(|state| state.status = CartStatus::Loading);
    }

    fn settle<T, F>(
        &self,
        operation: CartOperation,
        result: Result<T, RepositoryError>,
        apply: F,
    ) -> Result<T, CartError>
    where
        F: FnOnce(&mut Vec<CartItem>, &T),
    {
        match result {
            Ok(value) => {
                self.state.send_modify(|state| {
                    apply(&mut state.items, &value);
                    state.status = CartStatus::Succeeded;
                    state.error = None;
                });
                debug!(operation = operation.as_str(), "cart operation succeeded");
                Ok(value)
            }
            Err(e) => {
                let error = CartError::from_failure(operation, &e);
                warn!(operation = operation.as_str(), error = %e, "cart operation failed");
                self.state.send_modify(|state| {
                    state.status = CartStatus::Failed;
                    state.error = Some(error.message.clone());
                });
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("CartStore")
            .field("items", &state.items.len())
            .field("status", &state.status)
            .finish_non_exhaustive()
    }
}
