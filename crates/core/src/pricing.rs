//! Cart pricing: line subtotals, the free-delivery threshold, and totals.
//!
//! Every figure is derived from the current line items on each call. Nothing
//! here keeps running totals, so pricing the same lines twice always yields the
//! same summary.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::Quantity;

/// Default flat delivery fee.
pub const DEFAULT_DELIVERY_FEE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Default subtotal at which delivery becomes free.
pub const DEFAULT_FREE_DELIVERY_THRESHOLD: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

/// Delivery pricing rules, fixed for the lifetime of a page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Fee charged when the subtotal is below the threshold.
    pub delivery_fee: Decimal,
    /// Subtotal at or above which delivery is free.
    pub free_delivery_threshold: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            delivery_fee: DEFAULT_DELIVERY_FEE,
            free_delivery_threshold: DEFAULT_FREE_DELIVERY_THRESHOLD,
        }
    }
}

/// One priced row of the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    /// Non-negative price of a single unit.
    pub unit_price: Decimal,
    /// Units in the line.
    pub quantity: Quantity,
}

impl LineItem {
    /// Create a line item.
    #[must_use]
    pub const fn new(unit_price: Decimal, quantity: Quantity) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }
}

/// Aggregate totals for a set of line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Sum of all line subtotals.
    pub subtotal: Decimal,
    /// Delivery fee after applying the threshold rule.
    pub delivery_fee: Decimal,
    /// `subtotal + delivery_fee`.
    pub total: Decimal,
}

impl CartSummary {
    /// Whether the delivery fee was waived.
    #[must_use]
    pub fn is_free_delivery(&self) -> bool {
        self.delivery_fee.is_zero()
    }
}

/// The cart pricing engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartPricing {
    rules: PricingRules,
}

impl CartPricing {
    /// Create a pricing engine with the given rules.
    #[must_use]
    pub const fn new(rules: PricingRules) -> Self {
        Self { rules }
    }

    /// The rules this engine applies.
    #[must_use]
    pub const fn rules(&self) -> PricingRules {
        self.rules
    }

    /// `unit_price * quantity`, rounded half-up to two decimal places.
    #[must_use]
    pub fn line_subtotal(&self, unit_price: Decimal, quantity: Quantity) -> Decimal {
        (unit_price * Decimal::from(quantity.get()))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Price a set of line items.
    ///
    /// An empty set has a zero subtotal, which is below any positive threshold,
    /// so the delivery fee applies to it like to any other small cart.
    #[must_use]
    pub fn summarize(&self, items: &[LineItem]) -> CartSummary {
        let subtotal: Decimal = items
            .iter()
            .map(|item| self.line_subtotal(item.unit_price, item.quantity))
            .sum();

        let delivery_fee = if subtotal >= self.rules.free_delivery_threshold {
            Decimal::ZERO
        } else {
            self.rules.delivery_fee
        };

        CartSummary {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }

    /// How much more the customer must add for free delivery (never negative).
    #[must_use]
    pub fn remaining_for_free_delivery(&self, subtotal: Decimal) -> Decimal {
        (self.rules.free_delivery_threshold - subtotal).max(Decimal::ZERO)
    }
}
