//! In-memory store.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use quotation_common::{CurrencyPair, IdempotencyKey, QuotationRequest, RequestId, Timestamp};
use tracing::debug;

use crate::store::{QuotationRequestStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    requests: HashMap<RequestId, QuotationRequest>,
    by_key: HashMap<IdempotencyKey, RequestId>,
}

/// In-memory implementation of [`QuotationRequestStore`].
///
/// A single exclusive lock guards all state; coarse but race-free. Suitable
/// for tests and local runs without a database.
#[derive(Debug, Default)]
pub struct InMemoryQuotationStore {
    inner: Mutex<Inner>,
}

impl InMemoryQuotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored requests.
    pub fn len(&self) -> usize {
        self.inner.lock().requests.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QuotationRequestStore for InMemoryQuotationStore {
    async fn create_or_get_by_idempotency_key(
        &self,
        request: &QuotationRequest,
    ) -> StoreResult<QuotationRequest> {
        let mut inner = self.inner.lock();

        if let Some(existing_id) = inner.by_key.get(&request.idempotency_key()) {
            let existing = inner.requests.get(existing_id).ok_or_else(|| {
                StoreError::Corrupted(format!("idempotency key points to missing request {existing_id}"))
            })?;
            debug!(request_id = %existing_id, "Idempotency key already used");
            return Ok(existing.clone());
        }

        inner.by_key.insert(request.idempotency_key(), request.id());
        inner.requests.insert(request.id(), request.clone());

        Ok(request.clone())
    }

    async fn get_by_id(&self, id: RequestId) -> StoreResult<Option<QuotationRequest>> {
        Ok(self.inner.lock().requests.get(&id).cloned())
    }

    async fn update_by_base_and_quote(
        &self,
        pair: CurrencyPair,
        rate: &str,
        completed_at: Timestamp,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.lock();
        let mut updated = 0;

        for request in inner
            .requests
            .values_mut()
            .filter(|r| r.pair() == pair && !r.is_completed())
        {
            request
                .complete(rate, completed_at)
                .map_err(|e| StoreError::Corrupted(e.to_string()))?;
            updated += 1;
        }

        Ok(updated)
    }

    async fn get_uniq_unhandled(&self) -> StoreResult<Vec<CurrencyPair>> {
        let inner = self.inner.lock();

        let pairs: BTreeSet<CurrencyPair> = inner
            .requests
            .values()
            .filter(|r| !r.is_completed())
            .map(|r| r.pair())
            .collect();

        Ok(pairs.into_iter().collect())
    }
}
