//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `auth` - Password sign-in, token refresh and sign-out
//! - `catalog` - Categories (cached) and product listings
//! - `orders` - Orders for the signed-in vendor

pub mod auth;
pub mod catalog;
pub mod orders;

pub use auth::{Auth, AuthError};
pub use catalog::CatalogService;
pub use orders::OrderService;
