//! Error types for the quotation manager and use cases.

use quotation_common::{CurrencyPair, QuotationError, RequestId};
use quotation_store::StoreError;
use thiserror::Error;

/// Lifecycle errors of the reconciliation loop.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ManagerError {
    #[error("Quotation manager is already running")]
    AlreadyRunning,

    #[error("Quotation manager is not running")]
    NotRunning,

    /// A stop is waiting for the in-flight iteration.
    #[error("Quotation manager is stopping")]
    Stopping,
}

/// Errors returned by [`crate::QuotationService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] QuotationError),

    #[error("No request with such id: {0}")]
    NoRequestWithSuchId(RequestId),

    /// The request exists but has not been resolved yet.
    #[error("Request {0} is not ready yet")]
    RequestNotReady(RequestId),

    /// The pair has never been resolved since startup.
    #[error("No quotation data for {0}")]
    NoQuotationData(CurrencyPair),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Domain(e) => e.error_code(),
            ServiceError::NoRequestWithSuchId(_) => "NO_REQUEST_WITH_SUCH_ID",
            ServiceError::RequestNotReady(_) => "REQUEST_NOT_READY",
            ServiceError::NoQuotationData(_) => "NO_QUOTATION_DATA",
            ServiceError::Store(_) => "STORE_ERROR",
        }
    }
}

/// Result type for use case operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quotation_common::Currency;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ServiceError::from(QuotationError::SameCurrency(Currency::USD)).error_code(),
            "SAME_CURRENCY"
        );
        assert_eq!(
            ServiceError::NoRequestWithSuchId(RequestId::new()).error_code(),
            "NO_REQUEST_WITH_SUCH_ID"
        );
        assert_eq!(
            ServiceError::Store(StoreError::Database("down".to_string())).error_code(),
            "STORE_ERROR"
        );
    }

    #[test]
    fn test_domain_message_is_passed_through() {
        let err = ServiceError::from(QuotationError::SameCurrency(Currency::EUR));
        assert_eq!(err.to_string(), "Currencies can't be same: EUR");
    }
}
