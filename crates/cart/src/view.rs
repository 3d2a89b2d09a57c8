//! Display data for the order summary.
//!
//! A [`SummaryView`] is a pure function of a [`CartSummary`]; it is rebuilt
//! from scratch on every render.

use countryfresh_core::{CartPricing, CartSummary, CurrencyCode, Price};

/// How the delivery row is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryLabel {
    Free,
    Amount(String),
}

/// Order summary display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub subtotal: String,
    pub delivery: DeliveryLabel,
    pub total: String,
    /// Free-delivery nudge, absent once the threshold is met.
    pub notice: Option<String>,
}

impl SummaryView {
    /// Render a summary priced by `pricing`.
    #[must_use]
    pub fn render(summary: &CartSummary, pricing: &CartPricing, currency: CurrencyCode) -> Self {
        let money = |amount| Price::new(amount, currency).display();

        let delivery = if summary.is_free_delivery() {
            DeliveryLabel::Free
        } else {
            DeliveryLabel::Amount(money(summary.delivery_fee))
        };

        let remaining = pricing.remaining_for_free_delivery(summary.subtotal);
        let notice = (!remaining.is_zero())
            .then(|| format!("Add {} more for free delivery!", money(remaining)));

        Self {
            subtotal: money(summary.subtotal),
            delivery,
            total: money(summary.total),
            notice,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use countryfresh_core::{LineItem, Quantity};
    use rust_decimal::Decimal;

    use super::*;

    fn render(prices: &[(i64, u32)]) -> SummaryView {
        let pricing = CartPricing::default();
        let items: Vec<LineItem> = prices
            .iter()
            .map(|(p, q)| LineItem::new(Decimal::from(*p), Quantity::new(*q).unwrap()))
            .collect();
        SummaryView::render(&pricing.summarize(&items), &pricing, CurrencyCode::NGN)
    }

    #[test]
    fn test_below_threshold() {
        let view = render(&[(1000, 1)]);
        assert_eq!(view.subtotal, "₦1000.00");
        assert_eq!(view.delivery, DeliveryLabel::Amount("₦500.00".to_string()));
        assert_eq!(view.total, "₦1500.00");
        assert_eq!(
            view.notice.as_deref(),
            Some("Add ₦4000.00 more for free delivery!")
        );
    }

    #[test]
    fn test_free_delivery_suppresses_notice() {
        let view = render(&[(1000, 1), (2000, 2)]);
        assert_eq!(view.delivery, DeliveryLabel::Free);
        assert_eq!(view.total, "₦5000.00");
        assert_eq!(view.notice, None);
    }
}
