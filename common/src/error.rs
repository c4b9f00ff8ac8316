//! Error types for quotation domain types.

use crate::{Currency, RequestId};
use thiserror::Error;

/// Domain errors raised by quotation types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuotationError {
    /// Base and quote currencies are the same.
    #[error("Currencies can't be same: {0}")]
    SameCurrency(Currency),

    /// Currency code outside of the supported set.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// The request already carries a rate.
    #[error("Quotation request {0} is already completed")]
    AlreadyCompleted(RequestId),

    /// A persisted record violates the request invariants.
    #[error("Inconsistent quotation request {id}: {reason}")]
    InconsistentRecord { id: RequestId, reason: String },
}

impl QuotationError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            QuotationError::SameCurrency(_) => "SAME_CURRENCY",
            QuotationError::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            QuotationError::AlreadyCompleted(_) => "ALREADY_COMPLETED",
            QuotationError::InconsistentRecord { .. } => "INCONSISTENT_RECORD",
        }
    }

    /// Check if the error was caused by client input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QuotationError::SameCurrency(_) | QuotationError::UnknownCurrency(_)
        )
    }
}

/// Result type alias for quotation domain operations.
pub type Result<T> = std::result::Result<T, QuotationError>;
