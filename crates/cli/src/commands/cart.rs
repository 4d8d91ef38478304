//! Cart commands.
//!
//! Mutations load the cart first so the printed state reflects the backend.

use tracing::info;

use vendor_dash_admin::cart::CartStore;
use vendor_dash_admin::error::AppError;
use vendor_dash_core::{CartItemId, ProductId, Quantity};

use super::DashboardSession;

/// Show the cart.
pub async fn list(session: &DashboardSession) -> Result<(), AppError> {
    let cart = session.state().cart();
    cart.fetch_all().await?;
    print_cart(cart);
    Ok(())
}

/// Set the quantity of a product in the cart.
pub async fn add(
    session: &DashboardSession,
    product: &ProductId,
    quantity: Quantity,
) -> Result<(), AppError> {
    let cart = session.state().cart();
    cart.fetch_all().await?;
    let line = cart.add(product, quantity).await?;
    info!(line = %line.id, product_id = %line.product_id, quantity = line.quantity.get(), "Added to cart");
    print_cart(cart);
    Ok(())
}

/// Change the quantity of a cart line.
pub async fn update(
    session: &DashboardSession,
    line: &CartItemId,
    quantity: Quantity,
) -> Result<(), AppError> {
    let cart = session.state().cart();
    cart.fetch_all().await?;
    cart.update_quantity(line, quantity).await?;
    print_cart(cart);
    Ok(())
}

/// Remove a cart line.
pub async fn remove(session: &DashboardSession, line: &CartItemId) -> Result<(), AppError> {
    let cart = session.state().cart();
    cart.fetch_all().await?;
    cart.remove(line).await?;
    print_cart(cart);
    Ok(())
}

/// Empty the cart.
pub async fn clear(session: &DashboardSession) -> Result<(), AppError> {
    session.state().cart().clear().await?;
    info!("Cart cleared");
    Ok(())
}

fn print_cart(cart: &CartStore) {
    let state = cart.snapshot();
    for item in &state.items {
        info!(
            line = %item.id,
            product_id = %item.product_id,
            quantity = item.quantity.get(),
            "cart line"
        );
    }
    info!(lines = state.items.len(), "Cart");
}
