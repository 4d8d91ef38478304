//! Catalog commands.

use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use vendor_dash_admin::error::AppError;
use vendor_dash_admin::models::{NewProduct, ProductFilter};
use vendor_dash_core::{CategoryId, Price};

use super::DashboardSession;

/// Fields for a new product.
#[derive(Args)]
pub struct CreateArgs {
    /// Product name
    #[arg(short, long)]
    name: String,

    /// Short specification line
    #[arg(long, default_value = "")]
    spec: String,

    /// Price in rupees
    #[arg(short, long, value_parser = parse_price)]
    price: Price,

    /// Price before discount
    #[arg(long, value_parser = parse_price)]
    old_price: Option<Price>,

    /// Star rating between 0 and 5
    #[arg(long, value_parser = parse_rating)]
    rating: Option<f64>,

    /// Discount percentage, e.g. `10` or `12.5%`
    #[arg(long, value_parser = parse_discount)]
    discount: Option<Decimal>,

    /// Image URL
    #[arg(long)]
    image: String,

    /// Category the product belongs to
    #[arg(short, long)]
    category: Option<CategoryId>,
}

impl From<CreateArgs> for NewProduct {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            spec: args.spec,
            price: args.price,
            old_price: args.old_price,
            rating: args.rating,
            discount: args.discount,
            image: args.image,
            category_id: args.category,
            user_id: None,
        }
    }
}

/// List all categories.
pub async fn categories(session: &DashboardSession) -> Result<(), AppError> {
    let categories = session.state().catalog().list_categories().await?;

    for category in categories.iter() {
        info!(
            id = %category.id,
            name = %category.name,
            description = category.description.as_deref().unwrap_or(""),
            "category"
        );
    }
    info!(count = categories.len(), "Categories listed");
    Ok(())
}

/// List products, optionally narrowed to a category, a name search, or the
/// signed-in vendor's own listings.
pub async fn list_products(
    session: &DashboardSession,
    category: Option<CategoryId>,
    search: Option<String>,
    mine: bool,
) -> Result<(), AppError> {
    let filter = ProductFilter {
        category_id: category,
        search,
        owner: None,
    };
    let catalog = session.state().catalog();
    let products = if mine {
        catalog.list_own_products(filter).await?
    } else {
        catalog.list_products(&filter).await?
    };

    for product in &products {
        info!(
            id = %product.id,
            name = %product.name,
            price = %product.price,
            category_id = product.category_id.as_ref().map_or("", |c| c.as_str()),
            "product"
        );
    }
    info!(count = products.len(), "Products listed");
    Ok(())
}

/// Create a product owned by the signed-in vendor.
pub async fn create_product(session: &DashboardSession, args: CreateArgs) -> Result<(), AppError> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("product name cannot be empty".to_string()));
    }
    if args.image.trim().is_empty() {
        return Err(AppError::BadRequest("product image cannot be empty".to_string()));
    }

    let product = session
        .state()
        .catalog()
        .create_product(NewProduct::from(args))
        .await?;
    info!(id = %product.id, name = %product.name, price = %product.price, "Product created");
    Ok(())
}

fn parse_price(s: &str) -> Result<Price, String> {
    Price::parse(s).map_err(|e| e.to_string())
}

fn parse_rating(s: &str) -> Result<f64, String> {
    let rating: f64 = s.trim().parse().map_err(|_| format!("not a number: {s}"))?;
    if (0.0..=5.0).contains(&rating) {
        Ok(rating)
    } else {
        Err(format!("rating must be between 0 and 5, got {rating}"))
    }
}

fn parse_discount(s: &str) -> Result<Decimal, String> {
    let discount: Decimal = s
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse()
        .map_err(|_| format!("not a percentage: {s}"))?;
    if discount.is_sign_negative() || discount > Decimal::ONE_HUNDRED {
        return Err(format!("discount must be between 0 and 100, got {discount}"));
    }
    Ok(discount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating_bounds() {
        assert!((parse_rating("4.5").unwrap() - 4.5).abs() < f64::EPSILON);
        assert!(parse_rating("5.1").is_err());
        assert!(parse_rating("-1").is_err());
        assert!(parse_rating("good").is_err());
    }

    #[test]
    fn test_parse_discount_accepts_percent_sign() {
        assert_eq!(parse_discount("12.5%").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_discount("10").unwrap(), Decimal::TEN);
        assert!(parse_discount("150").is_err());
    }

    #[test]
    fn test_parse_price_accepts_symbol() {
        assert_eq!(parse_price("₹1,299").unwrap(), Price::parse("1299").unwrap());
        assert!(parse_price("free").is_err());
    }

    #[test]
    fn test_create_args_leave_owner_unset() {
        let args = CreateArgs {
            name: "Assam Tea".to_string(),
            spec: "250g".to_string(),
            price: Price::parse("349").unwrap(),
            old_price: None,
            rating: None,
            discount: None,
            image: "https://cdn.test/tea.png".to_string(),
            category: Some(CategoryId::new("3")),
        };

        let product = NewProduct::from(args);
        assert_eq!(product.category_id, Some(CategoryId::new("3")));
        assert!(product.user_id.is_none());
    }
}
