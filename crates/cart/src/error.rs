//! Unified error handling for the cart runtime.
//!
//! Remote failures never break the page: callers catch a `CartError` at the
//! call site, log it, and turn it into a user-facing notification. Invalid
//! quantity input is not an error at all; it is clamped silently.

use thiserror::Error;

use crate::offline::StoreError;

/// Cart-level error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request never completed (connection, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// A form action or endpoint could not be resolved against the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The offline cart could not be read or written.
    #[error("Offline store error: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    /// Whether the failure happened on the far side of the network.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Server { .. })
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
