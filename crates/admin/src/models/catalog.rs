//! Catalog records: products and categories.

use rust_decimal::Decimal;
use serde::Serialize;

use vendor_dash_core::{CategoryId, Price, ProductId, UserId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
}

/// A product listed by a vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Short specification line shown under the name.
    pub spec: String,
    pub price: Price,
    /// Price before discount, if the vendor set one.
    pub old_price: Option<Price>,
    /// Star rating in `0.0..=5.0`.
    pub rating: Option<f64>,
    /// Discount percentage.
    pub discount: Option<Decimal>,
    pub image: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Vendor who owns the listing.
    pub user_id: Option<UserId>,
}

/// Fields accepted when creating a product.
///
/// Numeric fields are written as text because the catalog columns are text.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub spec: String,
    #[serde(serialize_with = "price_as_text")]
    pub price: Price,
    #[serde(rename = "oldPrice", serialize_with = "opt_price_as_text")]
    pub old_price: Option<Price>,
    #[serde(serialize_with = "opt_display_as_text")]
    pub rating: Option<f64>,
    #[serde(serialize_with = "opt_display_as_text")]
    pub discount: Option<Decimal>,
    pub image: String,
    pub category_id: Option<CategoryId>,
    pub user_id: Option<UserId>,
}

/// Filters for product listings. All filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    /// Only products owned by this vendor.
    pub owner: Option<UserId>,
}

fn price_as_text<S: serde::Serializer>(price: &Price, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&price.amount().to_string())
}

fn opt_price_as_text<S: serde::Serializer>(price: &Option<Price>, s: S) -> Result<S::Ok, S::Error> {
    match price {
        Some(p) => price_as_text(p, s),
        None => s.serialize_str(""),
    }
}

fn opt_display_as_text<T: std::fmt::Display, S: serde::Serializer>(
    value: &Option<T>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.serialize_str(&v.to_string()),
        None => s.serialize_str(""),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_serializes_text_columns() {
        let product = NewProduct {
            name: "Assam Tea".to_string(),
            spec: "250g loose leaf".to_string(),
            price: Price::parse("349").unwrap(),
            old_price: None,
            rating: Some(4.5),
            discount: Some(Decimal::new(10, 0)),
            image: "https://cdn.test/tea.png".to_string(),
            category_id: Some(CategoryId::new("3")),
            user_id: Some(UserId::new("u1")),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], "349");
        assert_eq!(json["oldPrice"], "");
        assert_eq!(json["rating"], "4.5");
        assert_eq!(json["discount"], "10");
        assert_eq!(json["category_id"], "3");
    }
}
