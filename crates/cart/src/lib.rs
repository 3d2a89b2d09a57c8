//! CountryFresh cart runtime.
//!
//! This crate provides the client-side cart as a library, so every flow can
//! be driven and tested without a browser.
//!
//! # Data Flow
//!
//! ```text
//! QuantityField --(QuantityChanged)--> CartPage (pricing, synchronous)
//!                                  \-> QuantitySignal --> CartReconciler --> CartRemote
//! ```
//!
//! The page recomputes totals from every row on each change; the reconciler
//! debounces changes per row and confirms them with the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod actions;
pub mod config;
pub mod error;
pub mod offline;
pub mod page;
pub mod reconciler;
pub mod remote;
pub mod selector;
pub mod signal;
pub mod surface;
pub mod view;

pub use actions::{AddToCartForm, CartActions};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Result};
pub use offline::{FileStore, KeyValueStore, MemoryStore, OfflineCartEntry, OfflineCartStore, StoreError};
pub use page::{CartPage, CartRow};
pub use reconciler::{CartReconciler, RowPhase};
pub use remote::{CartRemote, HttpCartClient};
pub use selector::QuantityField;
pub use signal::{LineForm, QuantityChanged, QuantitySignal};
pub use surface::{
    BadgeState, ButtonState, CartSurface, Notification, NotificationLevel, RecordingSurface,
    RowVisual, TracingSurface,
};
pub use view::{DeliveryLabel, SummaryView};
