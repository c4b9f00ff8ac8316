//! HTTP handlers and their request/response bodies.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use quotation_common::{unix_millis, Currency, IdempotencyKey, RequestId, RequestStatus};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::cache::QuotationInfo;
use crate::error::ServiceError;
use crate::manager::QuotationManager;
use crate::service::QuotationService;

/// Shared state handed to every handler.
pub struct AppState {
    pub service: Arc<QuotationService>,
}

impl AppState {
    pub fn new(service: Arc<QuotationService>) -> Self {
        Self { service }
    }
}

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Domain(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServiceError::NoRequestWithSuchId(_) | ServiceError::NoQuotationData(_) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::RequestNotReady(_) => StatusCode::CONFLICT,
            ServiceError::Domain(_) | ServiceError::Store(_) => {
                error!(error = %err, "Request failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("INTERNAL_ERROR", "Something went wrong")),
                );
            }
        };

        (status, Json(ErrorResponse::new(err.error_code(), err.to_string())))
    }
}

fn validation_error(code: &str, message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(code, message)))
}

fn parse_currency(field: &str, value: Option<&str>) -> Result<Currency, ApiError> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| validation_error("INVALID_CURRENCY", format!("Invalid {field} currency")))
}

/// Body of `POST /quotation/update-request`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuotationUpdateBody {
    pub base_currency: String,
    pub quote_currency: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuotationUpdateResponse {
    pub request_id: RequestId,
}

/// Status of a request; `rate` and `updatedAt` are present only when ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationByRequestIdResponse {
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    /// Unix timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationResponse {
    pub rate: String,
    /// Unix timestamp in milliseconds.
    pub updated_at: i64,
}

impl From<QuotationInfo> for QuotationResponse {
    fn from(info: QuotationInfo) -> Self {
        Self {
            rate: info.rate,
            updated_at: unix_millis(info.updated_at),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastRequestedParams {
    pub base: Option<String>,
    pub quote: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyListResponse {
    pub currencies: Vec<Currency>,
}

/// Record a quotation update request.
#[instrument(skip(state, body))]
pub async fn request_quotation_update(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RequestQuotationUpdateBody>, JsonRejection>,
) -> Result<Json<RequestQuotationUpdateResponse>, ApiError> {
    let Json(body) =
        body.map_err(|rejection| validation_error("INVALID_BODY", rejection.body_text()))?;
    let base = parse_currency("base", Some(&body.base_currency))?;
    let quote = parse_currency("quote", Some(&body.quote_currency))?;
    let idempotency_key = IdempotencyKey::parse(&body.idempotency_key).map_err(|_| {
        validation_error("INVALID_IDEMPOTENCY_KEY", "Idempotency key should be uuid")
    })?;

    let request_id = state
        .service
        .request_quotation_update(base, quote, idempotency_key)
        .await?;

    Ok(Json(RequestQuotationUpdateResponse { request_id }))
}

/// Status of one request; `NotReady` is a normal answer, not an error.
#[instrument(skip(state))]
pub async fn get_quotation_by_request_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QuotationByRequestIdResponse>, ApiError> {
    let id = RequestId::parse(&id)
        .map_err(|_| validation_error("INVALID_ID", "Invalid id format. Should be uuid"))?;

    match state.service.get_quotation_by_request_id(id).await {
        Ok(info) => Ok(Json(QuotationByRequestIdResponse {
            status: RequestStatus::Ready,
            rate: Some(info.rate),
            updated_at: Some(unix_millis(info.updated_at)),
        })),
        Err(ServiceError::RequestNotReady(_)) => Ok(Json(QuotationByRequestIdResponse {
            status: RequestStatus::NotReady,
            rate: None,
            updated_at: None,
        })),
        Err(e) => Err(e.into()),
    }
}

/// Last resolved rate of a pair.
pub async fn get_last_requested_quotation(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LastRequestedParams>,
) -> Result<Json<QuotationResponse>, ApiError> {
    let base = parse_currency("base", params.base.as_deref())?;
    let quote = parse_currency("quote", params.quote.as_deref())?;

    let info = state.service.get_quotation(base, quote)?;

    Ok(Json(info.into()))
}

/// Supported currency codes.
pub async fn get_currency_list(State(state): State<Arc<AppState>>) -> Json<CurrencyListResponse> {
    Json(CurrencyListResponse {
        currencies: state.service.currencies(),
    })
}

/// Prometheus scrape endpoint.
pub async fn get_metrics(State(manager): State<Arc<QuotationManager>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        manager.prometheus_metrics(),
    )
}
