//! Vendor product listings.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use vendor_dash_core::{CategoryId, Price, ProductId, UserId};

use super::{RepositoryError, scalar_text};
use crate::backend::BackendClient;
use crate::models::{NewProduct, Product, ProductFilter};

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: ProductId,
    name: Option<String>,
    #[serde(default)]
    spec: Option<String>,
    #[serde(default)]
    price: Option<serde_json::Value>,
    #[serde(default, rename = "oldPrice")]
    old_price: Option<serde_json::Value>,
    #[serde(default)]
    rating: Option<serde_json::Value>,
    #[serde(default)]
    discount: Option<serde_json::Value>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    category_id: Option<CategoryId>,
    #[serde(default)]
    user_id: Option<UserId>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |what: &str| RepositoryError::DataCorruption(format!("product {id}: {what}"));

        let name = row
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| corrupt("missing name"))?;
        let price = scalar_text(row.price)
            .ok_or_else(|| corrupt("missing price"))
            .and_then(|p| Price::parse(&p).map_err(|e| corrupt(&e.to_string())))?;
        let old_price = scalar_text(row.old_price)
            .map(|p| Price::parse(&p).map_err(|e| corrupt(&format!("old price: {e}"))))
            .transpose()?;
        let rating = scalar_text(row.rating)
            .map(|r| {
                r.parse::<f64>()
                    .ok()
                    .filter(|r| (0.0..=5.0).contains(r))
                    .ok_or_else(|| corrupt(&format!("rating out of range: {r}")))
            })
            .transpose()?;
        let discount = scalar_text(row.discount)
            .map(|d| {
                d.trim_end_matches('%')
                    .parse::<Decimal>()
                    .map_err(|e| corrupt(&format!("discount: {e}")))
            })
            .transpose()?;

        Ok(Self {
            id,
            name,
            spec: row.spec.unwrap_or_default(),
            price,
            old_price,
            rating,
            discount,
            image: row.image.filter(|s| !s.is_empty()),
            category_id: row.category_id,
            user_id: row.user_id,
        })
    }
}

/// Repository for products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    client: BackendClient,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Products matching every filter that is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut query = self.client.from("products").select("*");
        if let Some(category_id) = &filter.category_id {
            query = query.eq("category_id", category_id);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.ilike_contains("name", search);
        }
        if let Some(owner) = &filter.owner {
            query = query.eq("user_id", owner);
        }

        let rows: Vec<ProductRow> = query.fetch_all().await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a product and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the insert is rejected.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = self
            .client
            .from("products")
            .select("*")
            .insert(product)
            .await?;

        row.try_into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(json: &str) -> ProductRow {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_row_with_text_columns() {
        let product = Product::try_from(row(
            r#"{"id":7,"name":"Assam Tea","spec":"250g","price":"₹349","oldPrice":"399",
                "rating":"4.5","discount":"12%","image":"t.png","category_id":3,"user_id":"v1"}"#,
        ))
        .unwrap();

        assert_eq!(product.id, ProductId::new("7"));
        assert_eq!(product.price.display(), "₹349.00");
        assert_eq!(product.old_price.map(|p| p.display()), Some("₹399.00".to_owned()));
        assert_eq!(product.rating, Some(4.5));
        assert_eq!(product.discount, Some(Decimal::new(12, 0)));
        assert_eq!(product.category_id, Some(CategoryId::new("3")));
    }

    #[test]
    fn test_row_with_numeric_and_blank_columns() {
        let product = Product::try_from(row(
            r#"{"id":8,"name":"Green Tea","price":120,"oldPrice":"","rating":null,"discount":""}"#,
        ))
        .unwrap();

        assert_eq!(product.price.display(), "₹120.00");
        assert!(product.old_price.is_none());
        assert!(product.rating.is_none());
        assert!(product.discount.is_none());
        assert_eq!(product.spec, "");
    }

    #[test]
    fn test_row_without_price_is_corrupt() {
        let err = Product::try_from(row(r#"{"id":9,"name":"Mystery"}"#)).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(m) if m.contains("missing price")));
    }

    #[test]
    fn test_row_with_bad_rating_is_corrupt() {
        let err =
            Product::try_from(row(r#"{"id":9,"name":"Tea","price":"10","rating":"9"}"#)).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
