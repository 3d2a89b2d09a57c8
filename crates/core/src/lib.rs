//! CountryFresh Core - Shared cart types library.
//!
//! This crate provides the types and pricing rules used by every CountryFresh
//! component:
//! - `cart` - Client-side cart runtime (quantity fields, reconciliation, offline store)
//! - `cli` - Command-line tools for quotes and offline cart management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no timers,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identifiers, prices, and quantities
//! - [`pricing`] - Line subtotals, delivery-fee threshold, and cart totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{CartPricing, CartSummary, LineItem, PricingRules};
pub use types::*;
