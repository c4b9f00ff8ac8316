//! Random rate source for local runs.

use async_trait::async_trait;
use quotation_common::Currency;
use rand::Rng;
use rust_decimal::Decimal;

use crate::error::RateSourceResult;
use crate::provider::{CurrencyRate, RateSource};

/// Serves a random two-decimal rate in `[0.10, 2000.10)` for every quote.
#[derive(Debug, Default, Clone)]
pub struct RandomRateSource;

impl RandomRateSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RateSource for RandomRateSource {
    fn name(&self) -> &str {
        "random"
    }

    async fn get_latest_rates(
        &self,
        _base: Currency,
        quotes: &[Currency],
    ) -> RateSourceResult<Vec<CurrencyRate>> {
        let observed_at = quotation_common::now();
        let mut rng = rand::thread_rng();

        let rates = quotes
            .iter()
            .map(|quote| {
                let cents: i64 = rng.gen_range(10..200_010);
                CurrencyRate::new(*quote, Decimal::new(cents, 2), observed_at)
            })
            .collect();

        Ok(rates)
    }
}
