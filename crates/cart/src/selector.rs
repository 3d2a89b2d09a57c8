//! The quantity input of a cart row or product page.
//!
//! Plus and minus buttons commit immediately. Typed text is only committed on
//! blur, so a burst of keystrokes produces a single change.

use countryfresh_core::Quantity;

/// State of one quantity input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityField {
    value: Quantity,
    text: String,
    dirty: bool,
}

impl Default for QuantityField {
    fn default() -> Self {
        Self::new(Quantity::MIN)
    }
}

impl QuantityField {
    /// Create a field showing the given quantity.
    #[must_use]
    pub fn new(value: Quantity) -> Self {
        Self {
            value,
            text: value.to_string(),
            dirty: false,
        }
    }

    /// Last committed quantity.
    #[must_use]
    pub const fn value(&self) -> Quantity {
        self.value
    }

    /// Text currently shown in the input.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Plus button. Returns the new quantity, or `None` at the maximum.
    pub fn plus(&mut self) -> Option<Quantity> {
        let next = self.value.increment()?;
        self.commit(next);
        Some(next)
    }

    /// Minus button. Returns the new quantity, or `None` at the minimum.
    pub fn minus(&mut self) -> Option<Quantity> {
        let next = self.value.decrement()?;
        self.commit(next);
        Some(next)
    }

    /// A key typed into the input. Non-digits are rejected and not inserted.
    pub fn keystroke(&mut self, c: char) -> bool {
        if !Quantity::accepts_keystroke(c) {
            return false;
        }
        self.text.push(c);
        self.dirty = true;
        true
    }

    /// Replace the input text wholesale (paste, select-and-type, clear).
    ///
    /// Nothing is filtered here; `blur` normalizes whatever ends up in the input.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.dirty = true;
    }

    /// The input lost focus. Normalizes the text and returns the committed
    /// quantity if the edit changed it.
    pub fn blur(&mut self) -> Option<Quantity> {
        if !self.dirty {
            return None;
        }
        let next = Quantity::normalize(&self.text);
        let changed = next != self.value;
        self.commit(next);
        changed.then_some(next)
    }

    fn commit(&mut self, value: Quantity) {
        self.value = value;
        self.text = value.to_string();
        self.dirty = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn field(value: u32) -> QuantityField {
        QuantityField::new(Quantity::new(value).unwrap())
    }

    #[test]
    fn test_blur_back_to_same_value_commits_nothing() {
        let mut f = field(5);
        f.set_text("05");
        assert_eq!(f.blur(), None);
        assert_eq!(f.text(), "5");

        f.set_text("");
        assert!(f.keystroke('5'));
        assert_eq!(f.blur(), None);
        assert_eq!(f.value().get(), 5);

        f.set_text("6");
        assert_eq!(f.blur().map(Quantity::get), Some(6));
    }

    #[test]
    fn test_plus_and_minus() {
        let mut f = field(5);
        assert_eq!(f.plus().map(Quantity::get), Some(6));
        assert_eq!(f.minus().map(Quantity::get), Some(5));
        assert_eq!(f.text(), "5");
    }

    #[test]
    fn test_boundary_presses_do_not_emit() {
        let mut top = field(99);
        assert_eq!(top.plus(), None);
        assert_eq!(top.value().get(), 99);

        let mut bottom = field(1);
        assert_eq!(bottom.minus(), None);
        assert_eq!(bottom.value().get(), 1);
    }

    #[test]
    fn test_keystrokes_commit_only_on_blur() {
        let mut f = field(1);
        f.set_text("");
        assert!(f.keystroke('1'));
        assert!(!f.keystroke('x'));
        assert!(f.keystroke('2'));
        assert_eq!(f.text(), "12");
        assert_eq!(f.value().get(), 1);

        assert_eq!(f.blur().map(Quantity::get), Some(12));
        assert_eq!(f.value().get(), 12);
    }

    #[test]
    fn test_blur_normalizes() {
        let mut f = field(3);
        f.set_text("250");
        assert_eq!(f.blur().map(Quantity::get), Some(99));
        assert_eq!(f.text(), "99");

        f.set_text("");
        assert_eq!(f.blur().map(Quantity::get), Some(1));
    }

    #[test]
    fn test_blur_without_edit_is_silent() {
        let mut f = field(3);
        assert_eq!(f.blur(), None);
        f.plus();
        assert_eq!(f.blur(), None);
    }
}
