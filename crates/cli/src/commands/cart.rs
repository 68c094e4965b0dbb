//! Cart inspection and mutation commands.
//!
//! Each command builds a short-lived engine over the configured storage
//! path and remote service. When `CART_API_SESSION_TOKEN` is set the CLI
//! resumes that session (authenticated mode plus a reconciling pull; a
//! configured token is an existing session, not a login event, so the
//! persisted snapshot is not re-migrated). Without a token everything runs
//! in guest mode against local storage only.

use thiserror::Error;

use bramble_cart::{
    CartConfig, CartEngine, CartError, CheckoutError, ConfigError, HttpCartClient,
    JsonFileStorage, SyncFailure, SyncOutcome,
};
use bramble_core::{Price, ProductId, ProductSnapshot};

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The mutation was refused locally.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The cart failed checkout validation.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Remote synchronization failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncFailure),
}

async fn engine() -> Result<CartEngine<HttpCartClient>, CartCliError> {
    dotenvy::dotenv().ok();

    let config = CartConfig::from_env()?;
    let authenticated = config.session_token.is_some();
    let client = HttpCartClient::new(&config)?;
    let storage = JsonFileStorage::new(config.storage_path.clone());
    let engine = CartEngine::new(client, Box::new(storage));

    if authenticated {
        engine.resume_session().await;
    }

    Ok(engine)
}

fn print_cart(engine: &CartEngine<HttpCartClient>) {
    let items = engine.items();
    if items.is_empty() {
        tracing::info!("Cart is empty ({})", engine.mode());
        return;
    }

    tracing::info!("Cart ({}):", engine.mode());
    for line in &items {
        tracing::info!(
            "  {} x{}  {}  ({} each, {}% off)",
            line.title,
            line.quantity,
            line.line_total().display(),
            line.unit_price.display(),
            line.discount_percent,
        );
    }
    tracing::info!("  Subtotal: {}", engine.subtotal().display());
    if engine.total_discount() != Price::ZERO {
        tracing::info!("  Discount: -{}", engine.total_discount().display());
    }
    tracing::info!("  Total:    {}", engine.total().display());
}

/// Print the cart lines and totals.
pub async fn show() -> Result<(), CartCliError> {
    let engine = engine().await?;
    print_cart(&engine);
    Ok(())
}

/// Add units of a product to the cart.
pub async fn add(
    product_id: &str,
    title: &str,
    price_minor_units: i64,
    stock: u32,
    discount: u8,
    quantity: u32,
) -> Result<(), CartCliError> {
    let engine = engine().await?;

    let product = ProductSnapshot {
        product_id: ProductId::new(product_id),
        title: title.to_owned(),
        unit_price: Price::from_minor_units(price_minor_units),
        discount_percent: discount,
        stock_quantity: stock,
        image_url: None,
    };

    engine.add_item(&product, quantity)?;
    engine.settle().await;
    print_cart(&engine);
    Ok(())
}

/// Remove a product's line from the cart.
pub async fn remove(product_id: &str) -> Result<(), CartCliError> {
    let engine = engine().await?;
    let id = ProductId::new(product_id);

    if !engine.is_in_cart(&id) {
        tracing::warn!("No cart line for product: {product_id}");
    }
    engine.remove_item(&id);
    engine.settle().await;
    print_cart(&engine);
    Ok(())
}

/// Set a line's quantity. Zero or negative removes the line.
pub async fn set_quantity(product_id: &str, quantity: i64) -> Result<(), CartCliError> {
    let engine = engine().await?;
    engine.set_quantity(&ProductId::new(product_id), quantity);
    engine.settle().await;
    print_cart(&engine);
    Ok(())
}

/// Remove every line from the cart.
pub async fn clear() -> Result<(), CartCliError> {
    let engine = engine().await?;
    engine.clear();
    engine.settle().await;
    tracing::info!("Cart cleared");
    Ok(())
}

/// Pull the authoritative remote cart, replacing local state.
pub async fn sync() -> Result<(), CartCliError> {
    let engine = engine().await?;

    match engine.force_sync().await? {
        SyncOutcome::Replaced { item_count } => {
            tracing::info!("Adopted remote cart ({item_count} lines)");
            print_cart(&engine);
        }
        SyncOutcome::SkippedGuestMode => {
            tracing::warn!("Guest mode, nothing to sync. Set CART_API_SESSION_TOKEN to log in.");
        }
    }
    Ok(())
}

/// Validate the cart for checkout and print the order snapshot.
pub async fn checkout() -> Result<(), CartCliError> {
    let engine = engine().await?;

    let snapshot = engine.validate_for_checkout().await?;
    tracing::info!("Cart is ready for checkout:");
    for line in &snapshot.items {
        tracing::info!("  {} x{}  {}", line.title, line.quantity, line.line_total().display());
    }
    tracing::info!("  Order total: {}", snapshot.total.display());
    Ok(())
}
