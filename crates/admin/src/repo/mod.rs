//! Typed access to the backend collections.
//!
//! # Collections
//!
//! - `profiles` - one row per auth user, carries the `role`
//! - `categories` - product categories
//! - `products` - vendor listings
//! - `orders` - orders, joined with `products`
//! - `cart_items` - cart lines, unique on `(user_id, product_id)`
//!
//! Each repository decodes rows into an internal `*Row` type that mirrors the
//! wire shape, then converts it into a domain model with `TryFrom`. Rows that
//! do not fit the model are rejected with [`RepositoryError::DataCorruption`]
//! instead of being passed through half-filled.

pub mod cart_items;
pub mod categories;
pub mod orders;
pub mod products;
pub mod profiles;

use thiserror::Error;

use crate::backend::BackendError;

pub use cart_items::CartItemRepository;
pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use profiles::ProfileRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A row came back that does not fit the typed record.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested row was not found.
    #[error("not found")]
    NotFound,

    /// The operation is scoped to the signed-in user and there is none.
    #[error("User not authenticated")]
    NotAuthenticated,
}

/// Read a text-or-number column as trimmed text. Blank and `null` become
/// `None`.
///
/// Catalog columns are declared as text but older rows were written as
/// numbers.
pub(crate) fn scalar_text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(Some(json!(" 12.5 "))), Some("12.5".to_owned()));
        assert_eq!(scalar_text(Some(json!(4))), Some("4".to_owned()));
        assert_eq!(scalar_text(Some(json!(""))), None);
        assert_eq!(scalar_text(Some(json!(null))), None);
        assert_eq!(scalar_text(None), None);
    }
}
