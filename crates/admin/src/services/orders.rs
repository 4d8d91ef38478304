//! Orders placed against the signed-in vendor's products.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::backend::BackendClient;
use crate::models::VendorOrder;
use crate::repo::{OrderRepository, RepositoryError};
use crate::session::SessionSource;

/// Order service.
#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    sessions: Arc<dyn SessionSource>,
}

impl OrderService {
    #[must_use]
    pub fn new(client: BackendClient, sessions: Arc<dyn SessionSource>) -> Self {
        Self {
            orders: OrderRepository::new(client),
            sessions,
        }
    }

    /// Orders for the signed-in vendor, each joined with its product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotAuthenticated` if no one is signed in.
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_vendor_orders(&self) -> Result<Vec<VendorOrder>, RepositoryError> {
        let vendor = self
            .sessions
            .get_session()
            .await
            .ok_or(RepositoryError::NotAuthenticated)?
            .user_id;

        let orders = self.orders.list_for_vendor(&vendor).await?;
        info!(vendor_id = %vendor, count = orders.len(), "vendor orders loaded");
        Ok(orders)
    }
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}
