//! Symbol value object for trading pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

const MIN_LEN: usize = 4;
const MAX_LEN: usize = 20;

/// A trading pair as the exchange names it, e.g. `BTCUSDT`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used by stream names (`btcusdt@trade`).
    #[must_use]
    pub fn to_stream_name(&self) -> String {
        self.0.to_lowercase()
    }

    /// Validate the symbol for order submission.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is not 4 to 20 ASCII letters or digits.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.len() < MIN_LEN || self.0.len() > MAX_LEN {
            return Err(DomainError::invalid(
                "symbol",
                format!("Symbol must be {MIN_LEN} to {MAX_LEN} characters"),
            ));
        }

        if !self.0.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid(
                "symbol",
                "Symbol contains invalid characters",
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
