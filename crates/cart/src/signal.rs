//! Typed quantity-change events.
//!
//! Every committed quantity change is published once on a [`QuantitySignal`].
//! Pricing reacts synchronously inside [`crate::CartPage`]; the reconciler
//! subscribes to the signal and syncs with the server.
//!
//! Delivery is lossless: each subscriber has its own unbounded queue, so a
//! burst of changes never drops a row's only update.

use std::sync::{Arc, Mutex, PoisonError};

use countryfresh_core::{LineId, Quantity};
use tokio::sync::mpsc;

/// The update form rendered for one cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineForm {
    /// Form action the update is posted to (relative to the server base URL).
    pub action: String,
    /// Other fields carried by the form (hidden inputs).
    pub fields: Vec<(String, String)>,
}

impl LineForm {
    /// Form field holding the quantity.
    pub const QUANTITY_FIELD: &'static str = "quantity";

    /// Create a form with no extra fields.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            fields: Vec::new(),
        }
    }

    /// Add a hidden field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// The submitted fields with `quantity` set to the given value.
    #[must_use]
    pub fn with_quantity(&self, quantity: Quantity) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = self
            .fields
            .iter()
            .filter(|(name, _)| name != Self::QUANTITY_FIELD)
            .cloned()
            .collect();
        fields.push((Self::QUANTITY_FIELD.to_string(), quantity.to_string()));
        fields
    }
}

/// A committed quantity change for one cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityChanged {
    /// Row that changed.
    pub line: LineId,
    /// New, already-normalized quantity.
    pub quantity: Quantity,
    /// The row's update form.
    pub form: LineForm,
}

/// Fan-out of [`QuantityChanged`] events to every subscriber.
///
/// Clones share subscribers. Subscriptions close once every clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct QuantitySignal {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<QuantityChanged>>>>,
}

impl QuantitySignal {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn emit(&self, change: QuantityChanged) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        if subscribers.is_empty() {
            tracing::trace!("Quantity change emitted with no subscribers");
        }
    }

    /// Subscribe to future changes.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<QuantityChanged> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_with_quantity_replaces_existing_field() {
        let form = LineForm::new("/update-cart/7")
            .with_field("quantity", "1")
            .with_field("csrf_token", "abc");
        let fields = form.with_quantity(Quantity::new(4).unwrap());
        assert_eq!(
            fields,
            vec![
                ("csrf_token".to_string(), "abc".to_string()),
                ("quantity".to_string(), "4".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_emit_reaches_subscribers() {
        let signal = QuantitySignal::default();
        let mut rx = signal.subscribe();
        let change = QuantityChanged {
            line: LineId::new("row-1"),
            quantity: Quantity::new(3).unwrap(),
            form: LineForm::new("/update-cart/1"),
        };
        signal.emit(change.clone());
        assert_eq!(rx.recv().await.unwrap(), change);
    }

    #[test]
    fn test_burst_is_delivered_in_full() {
        let signal = QuantitySignal::new();
        let mut rx = signal.subscribe();
        for quantity in (1..=99).chain((1..=99).rev()) {
            signal.emit(QuantityChanged {
                line: LineId::new("row-1"),
                quantity: Quantity::new(quantity).unwrap(),
                form: LineForm::new("/update-cart/1"),
            });
        }

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 198);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_forgotten_and_close_follows_signal() {
        let signal = QuantitySignal::new();
        drop(signal.subscribe());
        let mut rx = signal.subscribe();

        signal.emit(QuantityChanged {
            line: LineId::new("row-1"),
            quantity: Quantity::MIN,
            form: LineForm::new("/update-cart/1"),
        });
        assert_eq!(signal.subscribers.lock().unwrap().len(), 1);
        assert!(rx.recv().await.is_some());

        drop(signal);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let signal = QuantitySignal::new();
        signal.emit(QuantityChanged {
            line: LineId::new("row-1"),
            quantity: Quantity::MIN,
            form: LineForm::new("/update-cart/1"),
        });
    }
}
