//! Quotation request entity and its lifecycle.

use serde::{Deserialize, Serialize};

use crate::error::{QuotationError, Result};
use crate::time::{now, Timestamp};
use crate::{Currency, CurrencyPair, IdempotencyKey, RequestId};

/// Lifecycle status of a quotation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Waiting for the reconciliation loop.
    NotReady,
    /// Rate resolved, terminal.
    Ready,
}

/// A client's request for a fresh rate of one currency pair.
///
/// Pending until `completed_at` is set; `rate` and `completed_at` are set
/// together, exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationRequest {
    id: RequestId,
    idempotency_key: IdempotencyKey,
    created_at: Timestamp,
    pair: CurrencyPair,
    completed_at: Option<Timestamp>,
    rate: Option<String>,
}

impl QuotationRequest {
    /// Create a new pending request.
    pub fn new(
        base: Currency,
        quote: Currency,
        idempotency_key: IdempotencyKey,
    ) -> Result<Self> {
        let pair = CurrencyPair::new(base, quote);
        pair.validate()?;

        Ok(Self {
            id: RequestId::new(),
            idempotency_key,
            created_at: now(),
            pair,
            completed_at: None,
            rate: None,
        })
    }

    /// Rebuild a request from persisted fields.
    pub fn restore(
        id: RequestId,
        idempotency_key: IdempotencyKey,
        created_at: Timestamp,
        pair: CurrencyPair,
        completed_at: Option<Timestamp>,
        rate: Option<String>,
    ) -> Result<Self> {
        pair.validate()?;

        if completed_at.is_some() != rate.is_some() {
            return Err(QuotationError::InconsistentRecord {
                id,
                reason: "rate and completed_at must be set together".to_string(),
            });
        }

        Ok(Self {
            id,
            idempotency_key,
            created_at,
            pair,
            completed_at,
            rate,
        })
    }

    /// Resolve the request with a rate.
    pub fn complete(&mut self, rate: impl Into<String>, completed_at: Timestamp) -> Result<()> {
        if self.is_completed() {
            return Err(QuotationError::AlreadyCompleted(self.id));
        }

        self.rate = Some(rate.into());
        self.completed_at = Some(completed_at);
        Ok(())
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn idempotency_key(&self) -> IdempotencyKey {
        self.idempotency_key
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn pair(&self) -> CurrencyPair {
        self.pair
    }

    pub fn base_currency(&self) -> Currency {
        self.pair.base
    }

    pub fn quote_currency(&self) -> Currency {
        self.pair.quote
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn rate(&self) -> Option<&str> {
        self.rate.as_deref()
    }

    /// Check if the request has been resolved.
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Get the lifecycle status.
    pub fn status(&self) -> RequestStatus {
        if self.is_completed() {
            RequestStatus::Ready
        } else {
            RequestStatus::NotReady
        }
    }
}
