//! Orders placed against a vendor's catalog.

use chrono::{DateTime, Utc};

use vendor_dash_core::{OrderId, Price, ProductId};

/// Delivery address as captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub title: String,
    pub subtitle: String,
}

/// Joined summary of the ordered product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Option<Price>,
    pub image: Option<String>,
}

/// An order row visible to the vendor that owns the product.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorOrder {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub payment_method: String,
    pub product_id: ProductId,
    pub quantity: u32,
    pub status: String,
    pub total: Price,
    pub address: Address,
    /// `None` when the product was deleted after the order was placed.
    pub product: Option<OrderProduct>,
}
