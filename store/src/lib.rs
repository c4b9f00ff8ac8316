//! Quotation Request Store
//!
//! Durable record of quotation requests, keyed by idempotency key.
//!
//! Two implementations satisfy the same [`QuotationRequestStore`] contract:
//!
//! - [`InMemoryQuotationStore`]: one exclusive lock around all state
//! - [`PostgresQuotationStore`]: sqlx pool, concurrency left to the database
//!
//! Both are checked by the shared suite in [`conformance`].

pub mod store;
pub mod in_memory;
pub mod postgres;

#[cfg(any(test, feature = "test-utils"))]
pub mod conformance;

pub use store::{QuotationRequestStore, SharedStore, StoreError, StoreResult};
pub use in_memory::InMemoryQuotationStore;
pub use postgres::{PostgresConfig, PostgresQuotationStore};
