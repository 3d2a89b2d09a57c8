//! Price a cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! cf-cli quote 1000x2 2000 750.50x3
//! ```
//!
//! Each item is a unit price, optionally followed by `x` and a quantity.

use countryfresh_cart::{CartConfig, DeliveryLabel, SummaryView};
use countryfresh_core::{CartPricing, CurrencyCode, LineItem, Quantity, QuantityError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while reading quote items.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Price part is not a decimal number.
    #[error("Invalid price in {0:?}")]
    InvalidPrice(String),

    /// Price is below zero.
    #[error("Negative price in {0:?}")]
    NegativePrice(String),

    /// Quantity part is not a whole number.
    #[error("Invalid quantity in {0:?}")]
    InvalidQuantity(String),

    /// Quantity is outside the allowed range.
    #[error("Quantity out of range in {item:?}: {source}")]
    QuantityRange {
        item: String,
        #[source]
        source: QuantityError,
    },
}

/// Parse `PRICE` or `PRICExQUANTITY`.
pub fn parse_item(item: &str) -> Result<LineItem, QuoteError> {
    let (price, quantity) = match item.split_once(['x', 'X']) {
        Some((price, quantity)) => (price, Some(quantity)),
        None => (item, None),
    };

    let unit_price: Decimal = price
        .trim()
        .parse()
        .map_err(|_| QuoteError::InvalidPrice(item.to_string()))?;
    if unit_price.is_sign_negative() {
        return Err(QuoteError::NegativePrice(item.to_string()));
    }

    let quantity = match quantity {
        None => Quantity::MIN,
        Some(raw) => {
            let raw: u32 = raw
                .trim()
                .parse()
                .map_err(|_| QuoteError::InvalidQuantity(item.to_string()))?;
            Quantity::new(raw).map_err(|source| QuoteError::QuantityRange {
                item: item.to_string(),
                source,
            })?
        }
    };

    Ok(LineItem::new(unit_price, quantity))
}

/// Price the items with the configured rules and print the summary.
///
/// # Errors
///
/// Returns error if any item cannot be parsed.
pub fn run(config: &CartConfig, items: &[String]) -> Result<(), QuoteError> {
    let items = items
        .iter()
        .map(|item| parse_item(item))
        .collect::<Result<Vec<_>, _>>()?;

    let pricing = CartPricing::new(config.pricing);
    let summary = pricing.summarize(&items);
    let view = SummaryView::render(&summary, &pricing, CurrencyCode::default());

    #[allow(clippy::print_stdout)]
    {
        println!("Subtotal: {}", view.subtotal);
        match &view.delivery {
            DeliveryLabel::Free => println!("Delivery: FREE"),
            DeliveryLabel::Amount(amount) => println!("Delivery: {amount}"),
        }
        println!("Total:    {}", view.total);
        if let Some(notice) = &view.notice {
            println!("{notice}");
        }
    }

    Ok(())
}
