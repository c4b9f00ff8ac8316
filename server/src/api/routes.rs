//! Route definitions for the HTTP API.
//!
//! ```text
//! /api/v1
//! ├── /quotation/update-request        POST - Request a quotation update
//! │   └── /{id}                        GET  - Request status and rate
//! ├── /quotation/last-requested        GET  - Last rate of ?base=&quote=
//! └── /currency/list                   GET  - Supported currencies
//! ```
//!
//! `/metrics` is served by a separate router on its own port.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    get_currency_list, get_last_requested_quotation, get_metrics, get_quotation_by_request_id,
    request_quotation_update, AppState,
};
use crate::manager::QuotationManager;

fn api_v1() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotation/update-request", post(request_quotation_update))
        .route(
            "/quotation/update-request/{id}",
            get(get_quotation_by_request_id),
        )
        .route("/quotation/last-requested", get(get_last_requested_quotation))
        .route("/currency/list", get(get_currency_list))
}

/// Creates the API router with request id, tracing and timeout middleware.
pub fn create_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1", api_v1())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}

/// Creates the router for the Prometheus scrape endpoint.
pub fn create_metrics_router(manager: Arc<QuotationManager>) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .with_state(manager)
}
