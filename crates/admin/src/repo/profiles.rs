//! Role lookup against the `profiles` collection.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use vendor_dash_core::{Role, UserId};

use super::RepositoryError;
use crate::backend::BackendClient;
use crate::guard::{RoleLookup, RoleLookupError};

#[derive(Debug, Deserialize)]
struct ProfileRow {
    role: Option<String>,
}

/// Repository for user profiles.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    client: BackendClient,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleLookup for ProfileRepository {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get_role(&self, user_id: &UserId) -> Result<Role, RoleLookupError> {
        let row: Option<ProfileRow> = self
            .client
            .from("profiles")
            .select("role")
            .eq("id", user_id)
            .fetch_optional()
            .await
            .map_err(RepositoryError::from)?;

        let row = row.ok_or_else(|| RoleLookupError::ProfileMissing(user_id.clone()))?;
        let role = row.role.unwrap_or_default();
        Ok(Role::parse(&role)?)
    }
}
