//! Cart lines in the `cart_items` collection.
//!
//! Every call is scoped to one user. The collection has a unique constraint
//! on `(user_id, product_id)`, which [`CartItemRepository::upsert`] targets so
//! that adding a product already in the cart overwrites its quantity.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use vendor_dash_core::{CartItem, CartItemId, ProductId, Quantity, UserId};

use super::RepositoryError;
use crate::backend::{BackendClient, BackendError};

const COLUMNS: &str = "id,product_id,quantity";

#[derive(Debug, Deserialize)]
struct CartItemRow {
    id: CartItemId,
    product_id: ProductId,
    quantity: i64,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("cart item {}: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            quantity,
        })
    }
}

#[derive(Serialize)]
struct UpsertCartItem<'a> {
    user_id: &'a UserId,
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct QuantityPatch {
    quantity: u32,
}

/// Repository for cart lines.
#[derive(Debug, Clone)]
pub struct CartItemRepository {
    client: BackendClient,
}

impl CartItemRepository {
    /// Create a new cart item repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// All cart lines for a user, in the order the backend returns them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows: Vec<CartItemRow> = self
            .client
            .from("cart_items")
            .select(COLUMNS)
            .eq("user_id", user_id)
            .fetch_all()
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a line, or overwrite the quantity of the user's existing line
    /// for the same product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write is rejected.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn upsert(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let body = UpsertCartItem {
            user_id,
            product_id,
            quantity: quantity.get(),
        };
        let row: CartItemRow = self
            .client
            .from("cart_items")
            .select(COLUMNS)
            .on_conflict("user_id,product_id")
            .upsert(&body)
            .await?;

        row.try_into()
    }

    /// Set the quantity of one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such line.
    #[instrument(skip(self), fields(user_id = %user_id, cart_item_id = %id))]
    pub async fn update_quantity(
        &self,
        user_id: &UserId,
        id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let row: CartItemRow = self
            .client
            .from("cart_items")
            .select(COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .update(&QuantityPatch {
                quantity: quantity.get(),
            })
            .await
            .map_err(missing_line)?;

        row.try_into()
    }

    /// Delete one of the user's lines. Deleting a missing line succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the delete is rejected.
    #[instrument(skip(self), fields(user_id = %user_id, cart_item_id = %id))]
    pub async fn delete(&self, user_id: &UserId, id: &CartItemId) -> Result<(), RepositoryError> {
        self.client
            .from("cart_items")
            .eq("id", id)
            .eq("user_id", user_id)
            .delete()
            .await?;
        Ok(())
    }

    /// Delete every line belonging to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the delete is rejected.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        self.client
            .from("cart_items")
            .eq("user_id", user_id)
            .delete()
            .await?;
        Ok(())
    }
}

/// A patch that matched no row means the line is not in this user's cart.
fn missing_line(error: BackendError) -> RepositoryError {
    match error {
        BackendError::NotFound(_) => RepositoryError::NotFound,
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_line_maps_not_found_only() {
        assert!(matches!(
            missing_line(BackendError::NotFound("0 rows".to_owned())),
            RepositoryError::NotFound
        ));
        assert!(matches!(
            missing_line(BackendError::Unauthorized("JWT expired".to_owned())),
            RepositoryError::Backend(BackendError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_row_conversion() {
        let row: CartItemRow =
            serde_json::from_str(r#"{"id":"a","product_id":12,"quantity":2}"#).unwrap();
        let item = CartItem::try_from(row).unwrap();
        assert_eq!(item.product_id.as_str(), "12");
        assert_eq!(item.quantity.get(), 2);
    }

    #[test]
    fn test_row_with_zero_quantity_is_corrupt() {
        let row: CartItemRow =
            serde_json::from_str(r#"{"id":"a","product_id":"p1","quantity":0}"#).unwrap();
        assert!(matches!(
            CartItem::try_from(row),
            Err(RepositoryError::DataCorruption(m)) if m.contains("cart item a")
        ));
    }

    #[test]
    fn test_upsert_body_shape() {
        let user = UserId::new("u1");
        let product = ProductId::new("p9");
        let body = UpsertCartItem {
            user_id: &user,
            product_id: &product,
            quantity: 3,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"user_id": "u1", "product_id": "p9", "quantity": 3})
        );
    }
}
