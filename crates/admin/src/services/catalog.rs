//! Product catalog: categories and vendor listings.
//!
//! Categories change rarely, so the listing is cached in memory with `moka`
//! for the configured TTL. Products are always read through.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info, instrument, warn};

use vendor_dash_core::UserId;

use crate::backend::BackendClient;
use crate::models::{Category, NewProduct, Product, ProductFilter};
use crate::repo::{CategoryRepository, ProductRepository, RepositoryError};
use crate::session::SessionSource;

const CATEGORIES_KEY: &str = "categories";

/// Catalog service.
///
/// Cheap to clone; clones share the category cache.
#[derive(Clone)]
pub struct CatalogService {
    categories: CategoryRepository,
    products: ProductRepository,
    sessions: Arc<dyn SessionSource>,
    cache: Cache<&'static str, Arc<Vec<Category>>>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        client: BackendClient,
        sessions: Arc<dyn SessionSource>,
        category_ttl: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(category_ttl)
            .build();

        Self {
            categories: CategoryRepository::new(client.clone()),
            products: ProductRepository::new(client),
            sessions,
            cache,
        }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backend call fails. Failures are not
    /// cached.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(categories) = self.cache.get(CATEGORIES_KEY).await {
            debug!(count = categories.len(), "categories served from cache");
            return Ok(categories);
        }

        let categories = Arc::new(self.categories.list().await?);
        self.cache
            .insert(CATEGORIES_KEY, Arc::clone(&categories))
            .await;
        Ok(categories)
    }

    /// Products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backend call fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.list(filter).await?;
        if products.is_empty() {
            warn!("no products matched");
        }
        Ok(products)
    }

    /// Products listed by the signed-in vendor, narrowed by `filter`.
    ///
    /// Any owner already set on `filter` is replaced.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotAuthenticated` if no one is signed in.
    pub async fn list_own_products(
        &self,
        mut filter: ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        filter.owner = Some(self.current_user().await?);
        self.list_products(&filter).await
    }

    /// Create a product owned by the signed-in vendor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotAuthenticated` if no one is signed in.
    /// Returns `RepositoryError::Backend` if the insert is rejected.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, mut product: NewProduct) -> Result<Product, RepositoryError> {
        let owner = self.current_user().await?;
        product.user_id = Some(owner);

        let created = self.products.create(&product).await?;
        info!(product_id = %created.id, "product created");
        Ok(created)
    }

    async fn current_user(&self) -> Result<UserId, RepositoryError> {
        self.sessions
            .get_session()
            .await
            .map(|session| session.user_id)
            .ok_or(RepositoryError::NotAuthenticated)
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("cached_categories", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}
