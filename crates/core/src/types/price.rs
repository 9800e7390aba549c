//! Unit price as carried through the cart.
//!
//! The cart never does arithmetic on prices. A price is kept as the JSON
//! number it arrived as, so any value the catalog sends survives a round
//! trip through storage. Decimal conversion is only used for display.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a JSON number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A unit price as received from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Number);

impl Price {
    /// The price as a decimal, if it fits in one.
    ///
    /// Returns `None` for magnitudes beyond `Decimal`'s range or values
    /// stored in exponent form.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        self.0.to_string().parse().ok()
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(Number::from(amount))
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Number::from_str(s.trim())
            .map(Self)
            .map_err(|_| PriceError::Invalid(s.to_string()))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_decimal() {
            Some(amount) => write!(f, "{amount:.2}"),
            None => write!(f, "{}", self.0),
        }
    }
}
