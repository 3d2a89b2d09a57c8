//! The page the cart draws on.
//!
//! The runtime never touches a DOM directly. Everything visible goes through
//! [`CartSurface`]: row loading states, toasts, the add-to-cart button, the
//! header badge, and full reloads.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use countryfresh_core::LineId;

/// Visual state of a cart row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowVisual {
    #[default]
    Normal,
    /// Quantity update in flight.
    Loading,
    /// Removal confirmed, navigation pending.
    Muted,
}

/// Severity of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

/// State of an add-to-cart submit button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    #[default]
    Idle,
    Adding,
    Added,
    Errored,
}

/// The cart count badge in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadgeState {
    pub count: u32,
    pub visible: bool,
}

impl BadgeState {
    /// Badge for a count; hidden when the cart is empty.
    #[must_use]
    pub const fn for_count(count: u32) -> Self {
        Self {
            count,
            visible: count > 0,
        }
    }
}

/// Everything the cart runtime can change on screen.
pub trait CartSurface: Send + Sync + 'static {
    /// Current visual state of a row.
    fn row_visual(&self, line: &LineId) -> RowVisual;

    /// Change the visual state of a row.
    fn set_row_visual(&self, line: &LineId, visual: RowVisual);

    /// Show a toast.
    fn notify(&self, notification: Notification);

    /// Re-render the whole cart from the server's state.
    fn resync(&self);

    /// Change the state of an add-to-cart button.
    fn set_button(&self, form_id: &str, state: ButtonState);

    /// Update the header badge.
    fn set_badge(&self, badge: BadgeState);
}

/// Headless surface that records every call.
///
/// Used by the CLI and tests to observe what a page would show.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    inner: Mutex<Recorded>,
}

#[derive(Debug, Default)]
struct Recorded {
    rows: HashMap<LineId, RowVisual>,
    visual_history: Vec<(LineId, RowVisual)>,
    notifications: Vec<Notification>,
    resyncs: usize,
    buttons: HashMap<String, ButtonState>,
    button_history: Vec<(String, ButtonState)>,
    badge: Option<BadgeState>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every notification shown so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    /// Every row visual change so far, oldest first.
    #[must_use]
    pub fn visual_history(&self) -> Vec<(LineId, RowVisual)> {
        self.lock().visual_history.clone()
    }

    /// How many times a full resync was requested.
    #[must_use]
    pub fn resyncs(&self) -> usize {
        self.lock().resyncs
    }

    /// Current state of a button.
    #[must_use]
    pub fn button(&self, form_id: &str) -> ButtonState {
        self.lock().buttons.get(form_id).copied().unwrap_or_default()
    }

    /// Every button change so far, oldest first.
    #[must_use]
    pub fn button_history(&self) -> Vec<(String, ButtonState)> {
        self.lock().button_history.clone()
    }

    /// Last badge shown, if any.
    #[must_use]
    pub fn badge(&self) -> Option<BadgeState> {
        self.lock().badge
    }
}

impl CartSurface for RecordingSurface {
    fn row_visual(&self, line: &LineId) -> RowVisual {
        self.lock().rows.get(line).copied().unwrap_or_default()
    }

    fn set_row_visual(&self, line: &LineId, visual: RowVisual) {
        let mut recorded = self.lock();
        recorded.rows.insert(line.clone(), visual);
        recorded.visual_history.push((line.clone(), visual));
    }

    fn notify(&self, notification: Notification) {
        self.lock().notifications.push(notification);
    }

    fn resync(&self) {
        self.lock().resyncs += 1;
    }

    fn set_button(&self, form_id: &str, state: ButtonState) {
        let mut recorded = self.lock();
        recorded.buttons.insert(form_id.to_string(), state);
        recorded.button_history.push((form_id.to_string(), state));
    }

    fn set_badge(&self, badge: BadgeState) {
        self.lock().badge = Some(badge);
    }
}

/// Surface that writes every change to the log.
#[derive(Debug, Default)]
pub struct TracingSurface {
    rows: Mutex<HashMap<LineId, RowVisual>>,
}

impl CartSurface for TracingSurface {
    fn row_visual(&self, line: &LineId) -> RowVisual {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(line)
            .copied()
            .unwrap_or_default()
    }

    fn set_row_visual(&self, line: &LineId, visual: RowVisual) {
        tracing::debug!(line = %line, ?visual, "Row visual changed");
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(line.clone(), visual);
    }

    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::warn!("{}", notification.message),
            NotificationLevel::Success | NotificationLevel::Info => {
                tracing::info!("{}", notification.message);
            }
        }
    }

    fn resync(&self) {
        tracing::info!("Cart resync requested");
    }

    fn set_button(&self, form_id: &str, state: ButtonState) {
        tracing::debug!(form_id, ?state, "Button state changed");
    }

    fn set_badge(&self, badge: BadgeState) {
        tracing::info!(count = badge.count, visible = badge.visible, "Cart badge updated");
    }
}
