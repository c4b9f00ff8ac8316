//! Quotation use cases: the command that records a request and the queries
//! that read results back.

use std::sync::Arc;

use quotation_common::{Currency, CurrencyPair, IdempotencyKey, QuotationRequest, RequestId};
use quotation_store::SharedStore;
use tracing::{error, info, instrument};

use crate::cache::QuotationInfo;
use crate::error::{ServiceError, ServiceResult};
use crate::manager::QuotationManager;

/// Entry point for API handlers.
pub struct QuotationService {
    store: SharedStore,
    manager: Arc<QuotationManager>,
}

impl QuotationService {
    pub fn new(store: SharedStore, manager: Arc<QuotationManager>) -> Self {
        Self { store, manager }
    }

    /// Record a request for a fresh rate of `base`/`quote`.
    ///
    /// Repeating the call with the same idempotency key returns the id of the
    /// request recorded first.
    #[instrument(skip(self), fields(base = %base, quote = %quote))]
    pub async fn request_quotation_update(
        &self,
        base: Currency,
        quote: Currency,
        idempotency_key: IdempotencyKey,
    ) -> ServiceResult<RequestId> {
        let request = QuotationRequest::new(base, quote, idempotency_key)?;

        let stored = self
            .store
            .create_or_get_by_idempotency_key(&request)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to save quotation request");
                e
            })?;

        info!(request_id = %stored.id(), "Quotation update requested");
        Ok(stored.id())
    }

    /// Rate recorded on a completed request.
    pub async fn get_quotation_by_request_id(&self, id: RequestId) -> ServiceResult<QuotationInfo> {
        let request = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NoRequestWithSuchId(id))?;

        match (request.rate(), request.completed_at()) {
            (Some(rate), Some(completed_at)) => Ok(QuotationInfo::new(rate, completed_at)),
            _ => Err(ServiceError::RequestNotReady(id)),
        }
    }

    /// Last resolved rate of `base`/`quote`.
    pub fn get_quotation(&self, base: Currency, quote: Currency) -> ServiceResult<QuotationInfo> {
        let pair = CurrencyPair::new(base, quote);
        pair.validate()?;

        self.manager
            .get_quotation(&pair)
            .ok_or(ServiceError::NoQuotationData(pair))
    }

    /// Supported currencies.
    pub fn currencies(&self) -> Vec<Currency> {
        Currency::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ManagerConfig;
    use quotation_common::QuotationError;
    use quotation_fx::MockRateSource;
    use quotation_store::InMemoryQuotationStore;
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    fn create_test_service() -> (QuotationService, Arc<QuotationManager>) {
        let store: SharedStore = Arc::new(InMemoryQuotationStore::new());
        let source = Arc::new(MockRateSource::new());
        source.set_rate(Currency::USD, Currency::MXN, dec!(20));
        source.set_rate(Currency::MXN, Currency::EUR, dec!(0.05));

        let manager = Arc::new(QuotationManager::new(
            ManagerConfig::default(),
            store.clone(),
            source,
        ));

        (QuotationService::new(store, manager.clone()), manager)
    }

    #[tokio::test]
    async fn test_request_same_currencies_is_rejected() {
        let (service, _) = create_test_service();

        let result = service
            .request_quotation_update(Currency::USD, Currency::USD, IdempotencyKey::new())
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Domain(QuotationError::SameCurrency(Currency::USD)))
        ));
    }

    #[tokio::test]
    async fn test_request_is_idempotent() {
        let (service, _) = create_test_service();
        let key = IdempotencyKey::new();

        let first = assert_ok!(
            service
                .request_quotation_update(Currency::USD, Currency::MXN, key)
                .await
        );
        let second = assert_ok!(
            service
                .request_quotation_update(Currency::USD, Currency::MXN, key)
                .await
        );
        let other = assert_ok!(
            service
                .request_quotation_update(Currency::USD, Currency::MXN, IdempotencyKey::new())
                .await
        );

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_get_by_request_id_lifecycle() {
        let (service, manager) = create_test_service();

        let unknown = service.get_quotation_by_request_id(RequestId::new()).await;
        assert!(matches!(unknown, Err(ServiceError::NoRequestWithSuchId(_))));

        let id = service
            .request_quotation_update(Currency::USD, Currency::MXN, IdempotencyKey::new())
            .await
            .unwrap();

        let pending = service.get_quotation_by_request_id(id).await;
        assert!(matches!(pending, Err(ServiceError::RequestNotReady(pending_id)) if pending_id == id));

        manager.reconcile_once().await;

        let info = assert_ok!(service.get_quotation_by_request_id(id).await);
        assert_eq!(info.rate, "20");
    }

    #[tokio::test]
    async fn test_get_quotation_reads_manager_cache() {
        let (service, manager) = create_test_service();

        assert!(matches!(
            service.get_quotation(Currency::MXN, Currency::EUR),
            Err(ServiceError::NoQuotationData(_))
        ));
        assert_err!(service.get_quotation(Currency::EUR, Currency::EUR));

        service
            .request_quotation_update(Currency::MXN, Currency::EUR, IdempotencyKey::new())
            .await
            .unwrap();
        manager.reconcile_once().await;

        let info = assert_ok!(service.get_quotation(Currency::MXN, Currency::EUR));
        assert_eq!(info.rate, "0.05");
    }

    #[test]
    fn test_currencies() {
        let (service, _) = create_test_service();
        assert_eq!(
            service.currencies(),
            vec![Currency::USD, Currency::EUR, Currency::MXN]
        );
    }
}
