//! Quotation Server
//!
//! The quotation manager owns the cache of resolved rates and the
//! reconciliation loop that completes pending requests. The use case layer
//! and the HTTP API sit on top of it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod service;
pub mod state;

pub use cache::{QuotationCache, QuotationInfo};
pub use config::ServerConfig;
pub use error::{ManagerError, ServiceError, ServiceResult};
pub use manager::{ManagerConfig, QuotationManager, ReconciliationReport};
pub use service::QuotationService;
