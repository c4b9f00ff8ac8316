//! Store trait and error types.

use std::sync::Arc;

use async_trait::async_trait;
use quotation_common::{CurrencyPair, QuotationRequest, RequestId, Timestamp};
use thiserror::Error;

/// Errors that can occur in a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored record could not be turned back into a request.
    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract consumed by the quotation manager and use cases.
///
/// Every operation is atomic with respect to concurrent callers.
#[async_trait]
pub trait QuotationRequestStore: Send + Sync {
    /// Insert `request` unless a request with the same idempotency key exists.
    ///
    /// Returns the stored request: `request` itself when inserted, otherwise
    /// the existing one. Callers adopt the returned identity.
    async fn create_or_get_by_idempotency_key(
        &self,
        request: &QuotationRequest,
    ) -> StoreResult<QuotationRequest>;

    /// Point lookup; `None` when absent.
    async fn get_by_id(&self, id: RequestId) -> StoreResult<Option<QuotationRequest>>;

    /// Complete every unhandled request for `pair` with `rate` at `completed_at`.
    ///
    /// Already completed requests are left untouched. Returns the number of
    /// requests completed.
    async fn update_by_base_and_quote(
        &self,
        pair: CurrencyPair,
        rate: &str,
        completed_at: Timestamp,
    ) -> StoreResult<u64>;

    /// Distinct pairs that have at least one unhandled request.
    async fn get_uniq_unhandled(&self) -> StoreResult<Vec<CurrencyPair>>;
}

/// Shared store handle.
pub type SharedStore = Arc<dyn QuotationRequestStore>;
