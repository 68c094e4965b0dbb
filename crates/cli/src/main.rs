//! Bramble CLI - cart inspection and sync tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the local cart
//! bramble cart show
//!
//! # Add two units of a product
//! bramble cart add -p prod-123 -t "Ceramic Mug" --price-minor-units 1850 --stock 12 -q 2
//!
//! # Change a line's quantity (zero removes the line)
//! bramble cart set-quantity -p prod-123 -q 1
//!
//! # Remove a line / empty the cart
//! bramble cart remove -p prod-123
//! bramble cart clear
//!
//! # Pull the authoritative remote cart (requires a session token)
//! bramble cart sync
//!
//! # Validate the cart for checkout
//! bramble cart checkout
//! ```
//!
//! # Environment Variables
//!
//! - `CART_API_BASE_URL` - Base URL of the remote cart service
//! - `CART_API_SESSION_TOKEN` - Session token; when set, the CLI runs in
//!   authenticated mode and mirrors mutations remotely
//! - `CART_STORAGE_PATH` - Local cart snapshot path

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bramble")]
#[command(author, version, about = "Bramble cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and mutate the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart lines and totals
    Show,
    /// Add units of a product to the cart
    Add {
        /// Product identifier
        #[arg(short, long)]
        product_id: String,

        /// Product title
        #[arg(short, long)]
        title: String,

        /// Unit price in minor units (cents)
        #[arg(long)]
        price_minor_units: i64,

        /// Stock available at the time of adding
        #[arg(long)]
        stock: u32,

        /// Discount percentage (0-100)
        #[arg(long, default_value_t = 0)]
        discount: u8,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product's line from the cart
    Remove {
        /// Product identifier
        #[arg(short, long)]
        product_id: String,
    },
    /// Set a line's quantity (zero or negative removes the line)
    SetQuantity {
        /// Product identifier
        #[arg(short, long)]
        product_id: String,

        /// New quantity
        #[arg(short, long, allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Remove every line from the cart
    Clear,
    /// Pull the authoritative remote cart, replacing local state
    Sync,
    /// Validate the cart for checkout and print the order snapshot
    Checkout,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await?,
            CartAction::Add {
                product_id,
                title,
                price_minor_units,
                stock,
                discount,
                quantity,
            } => {
                commands::cart::add(
                    &product_id,
                    &title,
                    price_minor_units,
                    stock,
                    discount,
                    quantity,
                )
                .await?;
            }
            CartAction::Remove { product_id } => commands::cart::remove(&product_id).await?,
            CartAction::SetQuantity {
                product_id,
                quantity,
            } => commands::cart::set_quantity(&product_id, quantity).await?,
            CartAction::Clear => commands::cart::clear().await?,
            CartAction::Sync => commands::cart::sync().await?,
            CartAction::Checkout => commands::cart::checkout().await?,
        },
    }
    Ok(())
}
