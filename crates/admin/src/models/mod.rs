//! Domain models for the dashboard.

pub mod catalog;
pub mod order;
pub mod session;

pub use catalog::{Category, NewProduct, Product, ProductFilter};
pub use order::{Address, OrderProduct, VendorOrder};
pub use session::Session;
