//! HTTP API over the quotation use cases.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ErrorResponse};
pub use routes::{create_metrics_router, create_router};
