//! Commands that talk to the storefront server.
//!
//! # Environment Variables
//!
//! - `COUNTRYFRESH_BASE_URL` - Storefront server to talk to

use std::sync::Arc;

use countryfresh_cart::{CartActions, CartConfig, CartError, HttpCartClient, TracingSurface};
use countryfresh_core::{ProductId, Quantity};

fn actions(config: &CartConfig) -> Result<CartActions<HttpCartClient, TracingSurface>, CartError> {
    let client = HttpCartClient::new(config.base_url.clone())?;
    Ok(CartActions::new(
        Arc::new(client),
        Arc::new(TracingSurface::default()),
        config.button_reset,
    ))
}

/// Print the server's cart count.
///
/// # Errors
///
/// Returns error if the server cannot be reached or answers with a failure.
pub async fn count(config: &CartConfig) -> Result<(), CartError> {
    let count = actions(config)?.refresh_badge().await?;
    #[allow(clippy::print_stdout)]
    {
        println!("{count}");
    }
    Ok(())
}

/// Add a product to the server cart.
///
/// `quantity` is read the way the storefront's quantity input reads it, so
/// blank or out-of-range text still adds at least one unit.
///
/// # Errors
///
/// Returns error if the server rejects the request.
pub async fn quick_add(config: &CartConfig, product: &str, quantity: &str) -> Result<(), CartError> {
    let quantity = Quantity::normalize(quantity);
    let actions = actions(config)?;
    actions.quick_add(&ProductId::new(product), quantity).await?;
    tracing::info!(product, quantity = quantity.get(), "Added to server cart");
    Ok(())
}
