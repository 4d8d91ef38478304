//! Order commands.

use tracing::info;

use vendor_dash_admin::error::AppError;

use super::DashboardSession;

/// List orders placed for the signed-in vendor's products.
pub async fn list(session: &DashboardSession) -> Result<(), AppError> {
    let orders = session.state().orders().list_vendor_orders().await?;

    for order in &orders {
        info!(
            id = %order.id,
            created_at = %order.created_at,
            status = %order.status,
            product = order.product.as_ref().map_or("", |p| p.name.as_str()),
            quantity = order.quantity,
            total = %order.total,
            payment_method = %order.payment_method,
            ship_to = %order.address.title,
            "order"
        );
    }
    info!(count = orders.len(), "Orders listed");
    Ok(())
}
