//! Cache of the last resolved rate per currency pair.

use std::collections::HashMap;

use parking_lot::RwLock;
use quotation_common::{CurrencyPair, Timestamp};
use tracing::debug;

/// Last known rate for an ordered pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotationInfo {
    /// Decimal rate as a string.
    pub rate: String,
    /// When the rate was last updated.
    pub updated_at: Timestamp,
}

impl QuotationInfo {
    /// Create an entry from a rate string and its update time.
    pub fn new(rate: impl Into<String>, updated_at: Timestamp) -> Self {
        Self {
            rate: rate.into(),
            updated_at,
        }
    }
}

/// Thread-safe rate cache.
///
/// Readers never block each other; writes are serialized. A write always
/// replaces the entry, whatever its timestamp: the last writer wins.
#[derive(Debug, Default)]
pub struct QuotationCache {
    entries: RwLock<HashMap<CurrencyPair, QuotationInfo>>,
}

impl QuotationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the entry for `pair`.
    pub fn get(&self, pair: &CurrencyPair) -> Option<QuotationInfo> {
        let entry = self.entries.read().get(pair).cloned();

        if entry.is_none() {
            debug!(pair = %pair, "Cache miss");
        }

        entry
    }

    /// Insert or overwrite the entry for `pair`.
    pub fn update(&self, pair: CurrencyPair, info: QuotationInfo) {
        self.entries.write().insert(pair, info);
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
