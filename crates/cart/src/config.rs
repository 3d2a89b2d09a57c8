//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `COUNTRYFRESH_BASE_URL` - Storefront server URL (default: `http://127.0.0.1:5000`)
//! - `COUNTRYFRESH_DELIVERY_FEE` - Flat delivery fee (default: 500)
//! - `COUNTRYFRESH_FREE_DELIVERY_THRESHOLD` - Subtotal for free delivery (default: 5000)
//! - `COUNTRYFRESH_DEBOUNCE_MS` - Quantity sync debounce window (default: 1000)
//! - `COUNTRYFRESH_BUTTON_RESET_MS` - Add-to-cart button reset delay (default: 2000)
//! - `COUNTRYFRESH_OFFLINE_DIR` - Directory for the offline cart (default: `.countryfresh`)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use countryfresh_core::PricingRules;
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_DEBOUNCE_MS: u64 = 1000;
const DEFAULT_BUTTON_RESET_MS: u64 = 2000;
const DEFAULT_OFFLINE_DIR: &str = ".countryfresh";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart runtime configuration.
///
/// Values are read once and stay fixed for the lifetime of the config.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Storefront server the cart talks to
    pub base_url: Url,
    /// Delivery fee and free-delivery threshold
    pub pricing: PricingRules,
    /// Quiet period before a quantity change is sent to the server
    pub debounce: Duration,
    /// How long the add-to-cart button shows its result before resetting
    pub button_reset: Duration,
    /// Directory backing the offline cart store
    pub offline_dir: PathBuf,
}

impl CartConfig {
    /// Build a configuration with default settings for the given server.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            pricing: PricingRules::default(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            button_reset: Duration::from_millis(DEFAULT_BUTTON_RESET_MS),
            offline_dir: PathBuf::from(DEFAULT_OFFLINE_DIR),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = parse_or_default(&lookup, "COUNTRYFRESH_BASE_URL", DEFAULT_BASE_URL)?;

        let defaults = PricingRules::default();
        let delivery_fee = parse_optional::<Decimal>(&lookup, "COUNTRYFRESH_DELIVERY_FEE")?
            .unwrap_or(defaults.delivery_fee);
        let free_delivery_threshold =
            parse_optional::<Decimal>(&lookup, "COUNTRYFRESH_FREE_DELIVERY_THRESHOLD")?
                .unwrap_or(defaults.free_delivery_threshold);

        for (key, value) in [
            ("COUNTRYFRESH_DELIVERY_FEE", delivery_fee),
            ("COUNTRYFRESH_FREE_DELIVERY_THRESHOLD", free_delivery_threshold),
        ] {
            if value.is_sign_negative() {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must not be negative".to_string(),
                ));
            }
        }

        let debounce_ms = parse_optional::<u64>(&lookup, "COUNTRYFRESH_DEBOUNCE_MS")?
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        let button_reset_ms = parse_optional::<u64>(&lookup, "COUNTRYFRESH_BUTTON_RESET_MS")?
            .unwrap_or(DEFAULT_BUTTON_RESET_MS);
        let offline_dir = lookup("COUNTRYFRESH_OFFLINE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_OFFLINE_DIR), PathBuf::from);

        Ok(Self {
            base_url,
            pricing: PricingRules {
                delivery_fee,
                free_delivery_threshold,
            },
            debounce: Duration::from_millis(debounce_ms),
            button_reset: Duration::from_millis(button_reset_ms),
            offline_dir,
        })
    }
}

/// Parse a variable if present.
fn parse_optional<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Parse a variable, falling back to a default value.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.pricing, PricingRules::default());
        assert_eq!(config.debounce, Duration::from_millis(1000));
        assert_eq!(config.button_reset, Duration::from_millis(2000));
        assert_eq!(config.offline_dir, PathBuf::from(".countryfresh"));
    }

    #[test]
    fn test_overrides() {
        let config = CartConfig::from_lookup(lookup_from(&[
            ("COUNTRYFRESH_BASE_URL", "https://shop.example.ng"),
            ("COUNTRYFRESH_DELIVERY_FEE", "750.50"),
            ("COUNTRYFRESH_FREE_DELIVERY_THRESHOLD", "10000"),
            ("COUNTRYFRESH_DEBOUNCE_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.base_url.host_str(), Some("shop.example.ng"));
        assert_eq!(config.pricing.delivery_fee, Decimal::new(75050, 2));
        assert_eq!(config.pricing.free_delivery_threshold, Decimal::from(10_000));
        assert_eq!(config.debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_number() {
        let err = CartConfig::from_lookup(lookup_from(&[("COUNTRYFRESH_DEBOUNCE_MS", "soon")]))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "COUNTRYFRESH_DEBOUNCE_MS")
        );
    }

    #[test]
    fn test_negative_fee_rejected() {
        let result = CartConfig::from_lookup(lookup_from(&[("COUNTRYFRESH_DELIVERY_FEE", "-1")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_url() {
        let result = CartConfig::from_lookup(lookup_from(&[("COUNTRYFRESH_BASE_URL", "not a url")]));
        assert!(result.is_err());
    }
}
