//! Orders placed against a vendor's products.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use vendor_dash_core::{OrderId, Price, ProductId, UserId};

use super::{RepositoryError, scalar_text};
use crate::backend::BackendClient;
use crate::models::{Address, OrderProduct, VendorOrder};

const SELECT: &str = "*,products(id,name,price,image)";

#[derive(Debug, Deserialize)]
struct AddressRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    subtitle: String,
}

#[derive(Debug, Deserialize)]
struct OrderProductRow {
    id: ProductId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Option<serde_json::Value>,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    id: OrderId,
    created_at: DateTime<Utc>,
    #[serde(default)]
    payment_method: Option<String>,
    product_id: ProductId,
    quantity: i64,
    #[serde(default)]
    status: Option<String>,
    total: Option<serde_json::Value>,
    #[serde(default)]
    address: Option<AddressRow>,
    #[serde(default)]
    products: Option<OrderProductRow>,
}

impl TryFrom<OrderRow> for VendorOrder {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |what: String| RepositoryError::DataCorruption(format!("order {id}: {what}"));

        let quantity = u32::try_from(row.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| corrupt(format!("invalid quantity {}", row.quantity)))?;
        let total = scalar_text(row.total)
            .ok_or_else(|| corrupt("missing total".to_owned()))
            .and_then(|t| Price::parse(&t).map_err(|e| corrupt(format!("total: {e}"))))?;
        let product = row
            .products
            .map(|p| {
                let price = scalar_text(p.price)
                    .map(|raw| Price::parse(&raw).map_err(|e| corrupt(format!("product price: {e}"))))
                    .transpose()?;
                Ok::<_, RepositoryError>(OrderProduct {
                    id: p.id,
                    name: p.name.unwrap_or_default(),
                    price,
                    image: p.image.filter(|s| !s.is_empty()),
                })
            })
            .transpose()?;
        let address = row.address.map_or_else(
            || Address {
                title: String::new(),
                subtitle: String::new(),
            },
            |a| Address {
                title: a.title,
                subtitle: a.subtitle,
            },
        );

        Ok(Self {
            id,
            created_at: row.created_at,
            payment_method: row.payment_method.unwrap_or_default(),
            product_id: row.product_id,
            quantity,
            status: row.status.unwrap_or_default(),
            total,
            address,
            product,
        })
    }
}

/// Repository for vendor orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    client: BackendClient,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Orders for the vendor, joined with the ordered product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    pub async fn list_for_vendor(
        &self,
        vendor_id: &UserId,
    ) -> Result<Vec<VendorOrder>, RepositoryError> {
        let rows: Vec<OrderRow> = self
            .client
            .from("orders")
            .select(SELECT)
            .eq("vendor_id", vendor_id)
            .fetch_all()
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(json: &str) -> OrderRow {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_joined_row() {
        let order = VendorOrder::try_from(row(
            r#"{"id":"o-1","created_at":"2024-05-01T10:00:00+00:00","payment_method":"upi",
                "product_id":7,"quantity":2,"status":"pending","total":698,
                "address":{"title":"Home","subtitle":"12 MG Road"},
                "products":{"id":7,"name":"Assam Tea","price":"349","image":"t.png"}}"#,
        ))
        .unwrap();

        assert_eq!(order.quantity, 2);
        assert_eq!(order.total.display(), "₹698.00");
        assert_eq!(order.address.title, "Home");
        let product = order.product.unwrap();
        assert_eq!(product.name, "Assam Tea");
        assert_eq!(product.price.map(|p| p.display()), Some("₹349.00".to_owned()));
    }

    #[test]
    fn test_deleted_product_leaves_join_empty() {
        let order = VendorOrder::try_from(row(
            r#"{"id":"o-2","created_at":"2024-05-01T10:00:00Z","product_id":7,"quantity":1,
                "total":"349","products":null}"#,
        ))
        .unwrap();
        assert!(order.product.is_none());
        assert_eq!(order.address.subtitle, "");
    }

    #[test]
    fn test_zero_quantity_is_corrupt() {
        let err = VendorOrder::try_from(row(
            r#"{"id":"o-3","created_at":"2024-05-01T10:00:00Z","product_id":7,"quantity":0,"total":1}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(m) if m.contains("o-3")));
    }
}
