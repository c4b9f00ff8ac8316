//! Rate source trait and the scripted mock implementation.

use async_trait::async_trait;
use quotation_common::{Currency, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::RateSourceResult;

/// One quote currency's rate against the requested base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRate {
    /// Quote currency.
    pub quote: Currency,
    /// Quote units per one base unit.
    pub rate: Decimal,
    /// When the rate was observed.
    pub observed_at: Timestamp,
}

impl CurrencyRate {
    /// Create a new rate.
    pub fn new(quote: Currency, rate: Decimal, observed_at: Timestamp) -> Self {
        Self {
            quote,
            rate,
            observed_at,
        }
    }

    /// Decimal string form stored on requests and in the cache.
    ///
    /// Trailing zeros are dropped: `20.00` renders as `"20"`.
    pub fn rate_string(&self) -> String {
        self.rate.normalize().to_string()
    }
}

/// Trait for external exchange rate sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Get current rates of `base` against every currency in `quotes`.
    ///
    /// Returns one rate per requested quote or fails as a whole.
    async fn get_latest_rates(
        &self,
        base: Currency,
        quotes: &[Currency],
    ) -> RateSourceResult<Vec<CurrencyRate>>;
}

/// Shared rate source handle.
pub type SharedRateSource = Arc<dyn RateSource>;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockRateSource;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::error::RateSourceError;
    use dashmap::DashMap;
    use parking_lot::Mutex;
    use quotation_common::CurrencyPair;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    /// Mock rate source for testing.
    ///
    /// Serves rates set with [`MockRateSource::set_rate`]; bases marked with
    /// [`MockRateSource::fail_base`] fail as a whole.
    #[derive(Default)]
    pub struct MockRateSource {
        rates: DashMap<CurrencyPair, Decimal>,
        failing: Mutex<HashSet<Currency>>,
        delays: Mutex<HashMap<Currency, Duration>>,
        calls: Mutex<Vec<(Currency, Vec<Currency>)>>,
    }

    impl MockRateSource {
        /// Create a new mock source with no rates.
        pub fn new() -> Self {
            Self::default()
        }

        /// Set a rate for a currency pair.
        pub fn set_rate(&self, base: Currency, quote: Currency, rate: Decimal) {
            self.rates.insert(CurrencyPair::new(base, quote), rate);
        }

        /// Make every call for `base` fail.
        pub fn fail_base(&self, base: Currency) {
            self.failing.lock().insert(base);
        }

        /// Let calls for `base` succeed again.
        pub fn recover_base(&self, base: Currency) {
            self.failing.lock().remove(&base);
        }

        /// Delay every call for `base`.
        pub fn delay_base(&self, base: Currency, delay: Duration) {
            self.delays.lock().insert(base, delay);
        }

        /// Calls received so far, as `(base, quotes)`.
        pub fn calls(&self) -> Vec<(Currency, Vec<Currency>)> {
            self.calls.lock().clone()
        }

        /// Number of calls received so far.
        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl RateSource for MockRateSource {
        fn name(&self) -> &str {
            "mock"
        }

        async fn get_latest_rates(
            &self,
            base: Currency,
            quotes: &[Currency],
        ) -> RateSourceResult<Vec<CurrencyRate>> {
            self.calls.lock().push((base, quotes.to_vec()));

            let delay = self.delays.lock().get(&base).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self.failing.lock().contains(&base) {
                return Err(RateSourceError::Unavailable(base));
            }

            let observed_at = quotation_common::now();
            quotes
                .iter()
                .map(|quote| {
                    let pair = CurrencyPair::new(base, *quote);
                    self.rates
                        .get(&pair)
                        .map(|rate| CurrencyRate::new(*quote, *rate, observed_at))
                        .ok_or(RateSourceError::MissingRate(pair))
                })
                .collect()
        }
    }
}
