//! Quotation FX Rate Sources
//!
//! Sources of current exchange rates consumed by the quotation manager.
//!
//! # Features
//!
//! - One batch call per base currency for any number of quote currencies
//! - Frankfurter HTTP source with a fixed request timeout
//! - Random source for local runs without network access
//! - Scripted mock source for tests (`test-utils` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use quotation_fx::{FrankfurterConfig, FrankfurterRateSource, RateSource};
//! use quotation_common::Currency;
//!
//! let source = FrankfurterRateSource::new(FrankfurterConfig::default())?;
//! let rates = source
//!     .get_latest_rates(Currency::USD, &[Currency::EUR, Currency::MXN])
//!     .await?;
//! ```

pub mod provider;
pub mod frankfurter;
pub mod random;
pub mod error;

pub use provider::{CurrencyRate, RateSource, SharedRateSource};
pub use frankfurter::{FrankfurterConfig, FrankfurterRateSource};
pub use random::RandomRateSource;
pub use error::{RateSourceError, RateSourceResult};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateSource;
