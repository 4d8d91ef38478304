//! Product categories.

use serde::Deserialize;
use tracing::instrument;

use vendor_dash_core::CategoryId;

use super::RepositoryError;
use crate::backend::BackendClient;
use crate::models::Category;

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: CategoryId,
    name: Option<String>,
    image: Option<String>,
    desc: Option<String>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let name = row
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| RepositoryError::DataCorruption(format!("category {} has no name", row.id)))?;

        Ok(Self {
            id: row.id,
            name,
            image: row.image.filter(|s| !s.is_empty()),
            description: row.desc.filter(|s| !s.is_empty()),
        })
    }
}

/// Repository for categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    client: BackendClient,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> = self
            .client
            .from("categories")
            .select("id,name,image,desc")
            .order("name", true)
            .fetch_all()
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let row: CategoryRow = serde_json::from_str(
            r#"{"id":3,"name":"Tea","image":"","desc":"Leaf and dust"}"#,
        )
        .unwrap();
        let category = Category::try_from(row).unwrap();
        assert_eq!(category.id, CategoryId::new("3"));
        assert_eq!(category.image, None);
        assert_eq!(category.description.as_deref(), Some("Leaf and dust"));
    }

    #[test]
    fn test_row_without_name_is_corrupt() {
        let row: CategoryRow = serde_json::from_str(r#"{"id":3,"name":null}"#).unwrap();
        assert!(matches!(
            Category::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
