//! Frankfurter (ECB reference rates) HTTP rate source.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use quotation_common::{Currency, CurrencyPair, Timestamp};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{RateSourceError, RateSourceResult};
use crate::provider::{CurrencyRate, RateSource};

/// Default provider URL.
const DEFAULT_API_URL: &str = "https://api.frankfurter.dev";

/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Configuration for the Frankfurter source.
#[derive(Debug, Clone)]
pub struct FrankfurterConfig {
    /// Base URL of the API, without the version path.
    pub api_url: String,
    /// Timeout for one whole request.
    pub timeout: Duration,
}

impl Default for FrankfurterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Body of `GET /v1/latest`.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[allow(dead_code)]
    base: String,
    #[allow(dead_code)]
    date: String,
    rates: HashMap<String, serde_json::Number>,
}

/// Rate source backed by the Frankfurter API.
pub struct FrankfurterRateSource {
    config: FrankfurterConfig,
    client: reqwest::Client,
}

impl FrankfurterRateSource {
    /// Create a new source with its own HTTP client.
    pub fn new(config: FrankfurterConfig) -> RateSourceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RateSourceError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn latest_url(&self, base: Currency, quotes: &[Currency]) -> String {
        let symbols = quotes
            .iter()
            .map(Currency::code)
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "{}/v1/latest?base={}&symbols={}",
            self.config.api_url.trim_end_matches('/'),
            base,
            symbols
        )
    }
}

/// Pick the requested quotes out of a decoded response.
fn rates_from_response(
    base: Currency,
    quotes: &[Currency],
    response: &LatestResponse,
    observed_at: Timestamp,
) -> RateSourceResult<Vec<CurrencyRate>> {
    quotes
        .iter()
        .map(|quote| {
            let number = response
                .rates
                .get(quote.code())
                .ok_or(RateSourceError::MissingRate(CurrencyPair::new(base, *quote)))?;

            let rate = Decimal::from_str(&number.to_string())
                .or_else(|_| Decimal::from_scientific(&number.to_string()))
                .map_err(|e| RateSourceError::Decode(format!("rate {number} for {quote}: {e}")))?;

            Ok(CurrencyRate::new(*quote, rate, observed_at))
        })
        .collect()
}

#[async_trait]
impl RateSource for FrankfurterRateSource {
    fn name(&self) -> &str {
        "frankfurter"
    }

    #[instrument(skip(self), fields(source = "frankfurter"))]
    async fn get_latest_rates(
        &self,
        base: Currency,
        quotes: &[Currency],
    ) -> RateSourceResult<Vec<CurrencyRate>> {
        let url = self.latest_url(base, quotes);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateSourceError::Status {
                base,
                status: status.as_u16(),
            });
        }

        let body: LatestResponse = response.json().await?;

        // The API only reports a date, so the fetch time stands in for it.
        let observed_at = quotation_common::now();
        let rates = rates_from_response(base, quotes, &body, observed_at)?;

        debug!(base = %base, count = rates.len(), "Fetched latest rates");

        Ok(rates)
    }
}
