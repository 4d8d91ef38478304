//! Cart backed by the `cart_items` collection.

use std::sync::Arc;

use async_trait::async_trait;

use vendor_dash_core::{CartItem, CartItemId, ProductId, Quantity, UserId};

use super::CartBackend;
use crate::backend::BackendClient;
use crate::repo::{CartItemRepository, RepositoryError};
use crate::session::SessionSource;

/// [`CartBackend`] scoped to whoever is signed in at call time.
#[derive(Clone)]
pub struct RemoteCart {
    sessions: Arc<dyn SessionSource>,
    items: CartItemRepository,
}

impl RemoteCart {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionSource>, client: BackendClient) -> Self {
        Self {
            sessions,
            items: CartItemRepository::new(client),
        }
    }

    async fn user_id(&self) -> Result<UserId, RepositoryError> {
        self.sessions
            .get_session()
            .await
            .map(|session| session.user_id)
            .ok_or(RepositoryError::NotAuthenticated)
    }
}

impl std::fmt::Debug for RemoteCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCart").finish_non_exhaustive()
    }
}

#[async_trait]
impl CartBackend for RemoteCart {
    async fn fetch_all(&self) -> Result<Vec<CartItem>, RepositoryError> {
        let user_id = self.user_id().await?;
        self.items.list(&user_id).await
    }

    async fn add(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let user_id = self.user_id().await?;
        self.items.upsert(&user_id, product_id, quantity).await
    }

    async fn update_quantity(
        &self,
        id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let user_id = self.user_id().await?;
        self.items.update_quantity(&user_id, id, quantity).await
    }

    async fn remove(&self, id: &CartItemId) -> Result<(), RepositoryError> {
        let user_id = self.user_id().await?;
        self.items.delete(&user_id, id).await
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        let user_id = self.user_id().await?;
        self.items.clear(&user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use crate::session::SessionStore;

    #[tokio::test]
    async fn test_signed_out_calls_fail_before_any_request() {
        let store = SessionStore::new();
        let client = BackendClient::new(&AdminConfig::for_tests("http://127.0.0.1:9/"), store.clone())
            .unwrap();
        let cart = RemoteCart::new(Arc::new(store), client);

        let err = cart.fetch_all().await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotAuthenticated));
        let err = cart.clear().await.unwrap_err();
        assert_eq!(err.to_string(), "User not authenticated");
    }
}
