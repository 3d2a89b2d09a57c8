//! The cart page model.
//!
//! Holds the rendered rows and their quantity inputs. Totals are never
//! stored: every read prices all rows again, so a partial update can't leave
//! a stale figure on screen.

use countryfresh_core::{
    CartPricing, CartSummary, CurrencyCode, LineId, LineItem, Price, ProductId, Quantity,
};
use tracing::{debug, instrument};

use crate::selector::QuantityField;
use crate::signal::{LineForm, QuantityChanged, QuantitySignal};
use crate::surface::{CartSurface, RowVisual};
use crate::view::SummaryView;

/// One product row of the cart page, as rendered by the server.
#[derive(Debug, Clone)]
pub struct CartRow {
    pub line: LineId,
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub field: QuantityField,
    pub form: LineForm,
    /// Link that removes the row server-side.
    pub remove_href: String,
}

impl CartRow {
    /// Build a row whose update form posts to `/update-cart/{product_id}` and
    /// whose remove link is `/remove-from-cart/{product_id}`.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            line: LineId::new(product_id.as_str()),
            form: LineForm::new(format!("/update-cart/{product_id}")),
            remove_href: format!("/remove-from-cart/{product_id}"),
            name: name.into(),
            unit_price,
            field: QuantityField::new(quantity),
            product_id,
        }
    }

    /// Committed quantity of the row.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.field.value()
    }
}

/// The cart page: rows, pricing, and the change signal.
#[derive(Debug)]
pub struct CartPage {
    rows: Vec<CartRow>,
    pricing: CartPricing,
    currency: CurrencyCode,
    signal: QuantitySignal,
}

impl CartPage {
    /// Create a page over server-rendered rows.
    #[must_use]
    pub fn new(rows: Vec<CartRow>, pricing: CartPricing, signal: QuantitySignal) -> Self {
        let currency = rows
            .first()
            .map(|row| row.unit_price.currency_code)
            .unwrap_or_default();
        Self {
            rows,
            pricing,
            currency,
            signal,
        }
    }

    /// All rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[CartRow] {
        &self.rows
    }

    /// Look up a row.
    #[must_use]
    pub fn row(&self, line: &LineId) -> Option<&CartRow> {
        self.rows.iter().find(|row| &row.line == line)
    }

    /// Plus button on a row.
    pub fn plus(&mut self, line: &LineId) -> Option<QuantityChanged> {
        self.apply(line, QuantityField::plus)
    }

    /// Minus button on a row.
    pub fn minus(&mut self, line: &LineId) -> Option<QuantityChanged> {
        self.apply(line, QuantityField::minus)
    }

    /// A key typed into a row's quantity input. Returns whether it was accepted.
    pub fn keystroke(&mut self, line: &LineId, c: char) -> bool {
        self.rows
            .iter_mut()
            .find(|row| &row.line == line)
            .is_some_and(|row| row.field.keystroke(c))
    }

    /// Replace the text of a row's quantity input.
    pub fn set_text(&mut self, line: &LineId, text: &str) {
        if let Some(row) = self.rows.iter_mut().find(|row| &row.line == line) {
            row.field.set_text(text);
        }
    }

    /// A row's quantity input lost focus.
    pub fn blur(&mut self, line: &LineId) -> Option<QuantityChanged> {
        self.apply(line, QuantityField::blur)
    }

    fn apply(
        &mut self,
        line: &LineId,
        op: impl FnOnce(&mut QuantityField) -> Option<Quantity>,
    ) -> Option<QuantityChanged> {
        let row = self.rows.iter_mut().find(|row| &row.line == line)?;
        let quantity = op(&mut row.field)?;
        let change = QuantityChanged {
            line: row.line.clone(),
            quantity,
            form: row.form.clone(),
        };

        debug!(
            line = %change.line,
            quantity = quantity.get(),
            total = %self.summary().total,
            "Quantity committed"
        );
        self.signal.emit(change.clone());
        Some(change)
    }

    /// Rows as priced line items.
    #[must_use]
    pub fn line_items(&self) -> Vec<LineItem> {
        self.rows
            .iter()
            .map(|row| LineItem::new(row.unit_price.amount, row.quantity()))
            .collect()
    }

    /// Price the current rows.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.pricing.summarize(&self.line_items())
    }

    /// Order summary display data for the current rows.
    #[must_use]
    pub fn render(&self) -> SummaryView {
        SummaryView::render(&self.summary(), &self.pricing, self.currency)
    }

    /// Formatted subtotal of every row, in display order.
    #[must_use]
    pub fn row_subtotals(&self) -> Vec<(LineId, String)> {
        self.rows
            .iter()
            .map(|row| {
                let subtotal = self
                    .pricing
                    .line_subtotal(row.unit_price.amount, row.quantity());
                (
                    row.line.clone(),
                    Price::new(subtotal, row.unit_price.currency_code).display(),
                )
            })
            .collect()
    }

    /// Ask to remove a row.
    ///
    /// `confirm` receives the question to put to the user. On confirmation the
    /// row is muted and the link to follow is returned; removal itself happens
    /// server-side.
    #[instrument(skip(self, surface, confirm))]
    pub fn request_remove(
        &self,
        line: &LineId,
        surface: &impl CartSurface,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Option<String> {
        let row = self.row(line)?;
        if !confirm(&format!("Remove {} from cart?", row.name)) {
            return None;
        }
        surface.set_row_visual(line, RowVisual::Muted);
        Some(row.remove_href.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::surface::RecordingSurface;
    use crate::view::DeliveryLabel;

    fn row(id: &str, name: &str, price: i64, quantity: u32) -> CartRow {
        CartRow::new(
            ProductId::new(id),
            name,
            Price::naira(Decimal::from(price)),
            Quantity::new(quantity).unwrap(),
        )
    }

    fn page(signal: QuantitySignal) -> CartPage {
        CartPage::new(
            vec![row("1", "Agege Bread", 1000, 1), row("2", "Meat Pie", 2000, 1)],
            CartPricing::default(),
            signal,
        )
    }

    #[test]
    fn test_plus_recomputes_totals() {
        let mut page = page(QuantitySignal::default());
        assert_eq!(page.summary().subtotal, Decimal::from(3000));
        assert_eq!(page.render().delivery, DeliveryLabel::Amount("₦500.00".to_string()));

        page.plus(&LineId::new("2")).unwrap();
        assert_eq!(page.summary().subtotal, Decimal::from(5000));
        assert_eq!(page.render().delivery, DeliveryLabel::Free);

        page.minus(&LineId::new("2")).unwrap();
        assert_eq!(page.summary().total, Decimal::from(3500));
    }

    #[test]
    fn test_changes_are_emitted_once() {
        let signal = QuantitySignal::default();
        let mut rx = signal.subscribe();
        let mut page = page(signal);
        let line = LineId::new("1");

        page.set_text(&line, "");
        assert!(page.keystroke(&line, '4'));
        assert!(!page.keystroke(&line, 'a'));
        assert!(rx.try_recv().is_err());

        let change = page.blur(&line).unwrap();
        assert_eq!(change.quantity.get(), 4);
        assert_eq!(change.form.action, "/update-cart/1");
        assert_eq!(rx.try_recv().unwrap(), change);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_boundary_press_emits_nothing() {
        let signal = QuantitySignal::default();
        let mut rx = signal.subscribe();
        let mut page = page(signal);

        assert!(page.minus(&LineId::new("1")).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unknown_row_is_ignored() {
        let mut page = page(QuantitySignal::default());
        let missing = LineId::new("404");
        assert!(page.plus(&missing).is_none());
        assert!(!page.keystroke(&missing, '1'));
    }

    #[test]
    fn test_row_subtotals() {
        let mut page = page(QuantitySignal::default());
        page.plus(&LineId::new("1")).unwrap();
        let subtotals = page.row_subtotals();
        assert_eq!(subtotals[0], (LineId::new("1"), "₦2000.00".to_string()));
        assert_eq!(subtotals[1], (LineId::new("2"), "₦2000.00".to_string()));
    }

    #[test]
    fn test_remove_requires_confirmation() {
        let page = page(QuantitySignal::default());
        let surface = RecordingSurface::new();
        let line = LineId::new("2");

        assert_eq!(page.request_remove(&line, &surface, |_| false), None);
        assert_eq!(surface.row_visual(&line), RowVisual::Normal);

        let mut asked = String::new();
        let href = page.request_remove(&line, &surface, |question| {
            asked = question.to_string();
            true
        });
        assert_eq!(asked, "Remove Meat Pie from cart?");
        assert_eq!(href.as_deref(), Some("/remove-from-cart/2"));
        assert_eq!(surface.row_visual(&line), RowVisual::Muted);
    }

    #[test]
    fn test_empty_page_still_priced_by_rule() {
        let page = CartPage::new(Vec::new(), CartPricing::default(), QuantitySignal::default());
        assert_eq!(page.summary().delivery_fee, Decimal::from(500));
    }
}
