//! Cart line items.

use serde::{Deserialize, Serialize};

use super::{CartItemId, ProductId, Quantity};

/// A single cart line: one product and how many of it.
///
/// The backend guarantees at most one line per (user, product) pair, so an
/// add for a product already in the cart comes back with the existing `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart line identifier assigned by the backend.
    pub id: CartItemId,
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: Quantity,
}

impl CartItem {
    /// Create a cart line.
    #[must_use]
    pub fn new(id: impl Into<CartItemId>, product_id: impl Into<ProductId>, quantity: Quantity) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            quantity,
        }
    }
}
