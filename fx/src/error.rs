//! Rate source error types.

use quotation_common::{Currency, CurrencyPair};
use thiserror::Error;

/// Errors that can occur while fetching rates.
///
/// A rate source call fails as a whole; there is no partial success.
#[derive(Debug, Error)]
pub enum RateSourceError {
    /// The request did not complete (connection, timeout).
    #[error("Rate source transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("Rate source answered with status {status} for base {base}")]
    Status { base: Currency, status: u16 },

    /// The provider response could not be decoded.
    #[error("Failed to decode rate source response: {0}")]
    Decode(String),

    /// A requested quote currency is absent from the response.
    #[error("Rate not found for currency pair {0}")]
    MissingRate(CurrencyPair),

    /// The source has no rates for this base currency.
    #[error("Rate source unavailable for base {0}")]
    Unavailable(Currency),
}

impl RateSourceError {
    /// Check if this error is likely transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            RateSourceError::Transport(_) | RateSourceError::Unavailable(_) => true,
            RateSourceError::Status { status, .. } => *status >= 500 || *status == 429,
            RateSourceError::Decode(_) | RateSourceError::MissingRate(_) => false,
        }
    }
}

impl From<reqwest::Error> for RateSourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RateSourceError::Decode(e.to_string())
        } else {
            RateSourceError::Transport(e.to_string())
        }
    }
}

/// Result type for rate source operations.
pub type RateSourceResult<T> = Result<T, RateSourceError>;
