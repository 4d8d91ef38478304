//! Vendor dashboard CLI - one-shot catalog, order and cart commands.
//!
//! # Usage
//!
//! ```bash
//! # List categories
//! vendor-dash categories
//!
//! # Search your own products in a category
//! vendor-dash products list --category 3 --search tea --mine
//!
//! # Create a product
//! vendor-dash products create --name "Assam Tea" --spec "250g" --price 349 \
//!     --image https://cdn.example.com/tea.png --category 3
//!
//! # Orders placed for your products
//! vendor-dash orders
//!
//! # Cart
//! vendor-dash cart add 17 --quantity 2
//! vendor-dash cart clear
//! ```
//!
//! Every command signs in with `VENDOR_DASH_EMAIL` / `VENDOR_DASH_PASSWORD`
//! and waits for the session guard. Accounts without the admin role are
//! turned away before the command runs.
//!
//! # Exit codes
//!
//! - `0` - success
//! - `1` - backend or internal failure
//! - `2` - bad configuration or arguments
//! - `3` - sign-in rejected or access denied

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use vendor_dash_admin::config::AdminConfig;
use vendor_dash_admin::error::AppError;
use vendor_dash_admin::telemetry;
use vendor_dash_core::{CartItemId, CategoryId, ProductId, Quantity};

mod commands;

const DEFAULT_LOG_FILTER: &str = "vendor_dash_cli=info,vendor_dash_admin=info";

#[derive(Parser)]
#[command(name = "vendor-dash")]
#[command(author, version, about = "Vendor dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List product categories
    Categories,
    /// Browse or create products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// List orders placed for your products
    Orders,
    /// Manage the signed-in user's cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<CategoryId>,

        /// Case-insensitive name search
        #[arg(short, long)]
        search: Option<String>,

        /// Only products you listed
        #[arg(long)]
        mine: bool,
    },
    /// Create a product owned by the signed-in vendor
    Create(commands::catalog::CreateArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    List,
    /// Set the quantity of a product in the cart
    Add {
        product: ProductId,

        #[arg(short, long, default_value = "1")]
        quantity: Quantity,
    },
    /// Change the quantity of a cart line
    Update {
        line: CartItemId,

        #[arg(short, long)]
        quantity: Quantity,
    },
    /// Remove a cart line
    Remove { line: CartItemId },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = AdminConfig::from_env();
    let log_json = config.as_ref().is_ok_and(|c| c.log_json);
    telemetry::init_tracing(DEFAULT_LOG_FILTER, log_json);

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        e.report();
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, config: AdminConfig) -> Result<(), AppError> {
    let session = commands::DashboardSession::open(config).await?;

    let result = match cli.command {
        Commands::Categories => commands::catalog::categories(&session).await,
        Commands::Products { action } => match action {
            ProductAction::List {
                category,
                search,
                mine,
            } => commands::catalog::list_products(&session, category, search, mine).await,
            ProductAction::Create(args) => commands::catalog::create_product(&session, args).await,
        },
        Commands::Orders => commands::orders::list(&session).await,
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&session).await,
            CartAction::Add { product, quantity } => {
                commands::cart::add(&session, &product, quantity).await
            }
            CartAction::Update { line, quantity } => {
                commands::cart::update(&session, &line, quantity).await
            }
            CartAction::Remove { line } => commands::cart::remove(&session, &line).await,
            CartAction::Clear => commands::cart::clear(&session).await,
        },
    };

    session.close().await;
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_products_list_flags() {
        let cli = Cli::try_parse_from([
            "vendor-dash",
            "products",
            "list",
            "--category",
            "3",
            "--search",
            "tea",
            "--mine",
        ])
        .unwrap();

        let Commands::Products {
            action:
                ProductAction::List {
                    category,
                    search,
                    mine,
                },
        } = cli.command
        else {
            panic!("expected products list");
        };
        assert_eq!(category, Some(CategoryId::new("3")));
        assert_eq!(search.as_deref(), Some("tea"));
        assert!(mine);
    }

    #[test]
    fn test_cart_add_defaults_to_one() {
        let cli = Cli::try_parse_from(["vendor-dash", "cart", "add", "17"]).unwrap();
        let Commands::Cart {
            action: CartAction::Add { product, quantity },
        } = cli.command
        else {
            panic!("expected cart add");
        };
        assert_eq!(product, ProductId::new("17"));
        assert_eq!(quantity.get(), 1);
    }

    #[test]
    fn test_cart_update_rejects_zero_quantity() {
        let result =
            Cli::try_parse_from(["vendor-dash", "cart", "update", "a1", "--quantity", "0"]);
        assert!(result.is_err());
    }
}
