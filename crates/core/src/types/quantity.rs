//! Line-item quantity type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`] strictly.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The quantity is zero.
    #[error("quantity must be at least 1")]
    Zero,
    /// The quantity exceeds the per-line maximum.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u32,
    },
}

/// A cart line quantity.
///
/// ## Constraints
///
/// - Always within `1..=99`
///
/// Strict construction goes through [`Quantity::new`]. User input goes
/// through the lenient rules instead, which never fail: [`Quantity::normalize`]
/// and [`Quantity::clamp`] pull any value back into range, and
/// [`Quantity::increment`] / [`Quantity::decrement`] stop at the bounds.
///
/// ## Examples
///
/// ```
/// use countryfresh_core::Quantity;
///
/// assert_eq!(Quantity::normalize("12").get(), 12);
/// assert_eq!(Quantity::normalize("abc").get(), 1);
/// assert_eq!(Quantity::normalize("150").get(), 99);
///
/// assert!(Quantity::MAX.increment().is_none());
/// assert!(Quantity::MIN.decrement().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Smallest quantity a line can hold.
    pub const MIN: Self = Self(1);
    /// Largest quantity a line can hold.
    pub const MAX: Self = Self(99);

    /// Create a quantity, rejecting out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is zero or greater than 99.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value < Self::MIN.0 {
            return Err(QuantityError::Zero);
        }
        if value > Self::MAX.0 {
            return Err(QuantityError::TooLarge { max: Self::MAX.0 });
        }
        Ok(Self(value))
    }

    /// Clamp any integer into `1..=99`.
    #[must_use]
    pub fn clamp(value: i64) -> Self {
        let clamped = value.clamp(i64::from(Self::MIN.0), i64::from(Self::MAX.0));
        // In range after the clamp above.
        Self(u32::try_from(clamped).unwrap_or(Self::MIN.0))
    }

    /// Normalize raw field text into a quantity.
    ///
    /// Reads an optional sign and the leading run of digits after any leading
    /// whitespace, ignoring whatever follows (`"12abc"` is 12). Text without
    /// leading digits, and zero, become 1; everything else is clamped.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        let (negative, rest) = if let Some(rest) = trimmed.strip_prefix('-') {
            (true, rest)
        } else {
            (false, trimmed.strip_prefix('+').unwrap_or(trimmed))
        };

        let mut seen_digit = false;
        let magnitude = rest
            .chars()
            .map_while(|c| c.to_digit(10))
            .fold(0_i64, |acc, digit| {
                seen_digit = true;
                acc.saturating_mul(10).saturating_add(i64::from(digit))
            });

        if !seen_digit || magnitude == 0 {
            return Self::MIN;
        }

        Self::clamp(if negative { -magnitude } else { magnitude })
    }

    /// Whether a keystroke may be typed into a quantity field.
    ///
    /// Only decimal digits are accepted. Already-present text is not touched.
    #[must_use]
    pub const fn accepts_keystroke(c: char) -> bool {
        c.is_ascii_digit()
    }

    /// The next quantity up, or `None` when already at the maximum.
    #[must_use]
    pub const fn increment(self) -> Option<Self> {
        if self.0 >= Self::MAX.0 {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }

    /// The next quantity down, or `None` when already at the minimum.
    #[must_use]
    pub const fn decrement(self) -> Option<Self> {
        if self.0 <= Self::MIN.0 {
            None
        } else {
            Some(Self(self.0 - 1))
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}
