//! Currency set and currency pairs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuotationError;

/// Supported ISO 4217 currency codes.
///
/// The set is closed: codes outside of it are rejected at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    MXN,
}

impl Currency {
    /// All supported currencies, in a stable order.
    pub const ALL: [Currency; 3] = [Currency::USD, Currency::EUR, Currency::MXN];

    /// Get the currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::MXN => "MXN",
        }
    }

    /// Get all supported currencies.
    pub fn all() -> Vec<Currency> {
        Self::ALL.to_vec()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = QuotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or_else(|| QuotationError::UnknownCurrency(s.to_string()))
    }
}

/// An ordered currency pair: the rate is quote units per one base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency.
    pub base: Currency,
    /// Quote currency (pricing currency).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote,
            quote: self.base,
        }
    }

    /// A pair is quotable only between two different currencies.
    pub fn validate(&self) -> Result<(), QuotationError> {
        if self.base == self.quote {
            return Err(QuotationError::SameCurrency(self.base));
        }
        Ok(())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
