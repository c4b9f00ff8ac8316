//! Shared conformance suite for [`QuotationRequestStore`] implementations.
//!
//! Every check takes a fresh, empty store. Run the whole suite with
//! [`run_all`], passing a factory that builds such a store.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use quotation_common::{Currency, CurrencyPair, IdempotencyKey, QuotationRequest};

use crate::store::SharedStore;

fn request(base: Currency, quote: Currency) -> QuotationRequest {
    QuotationRequest::new(base, quote, IdempotencyKey::new()).unwrap()
}

fn sorted(mut pairs: Vec<CurrencyPair>) -> Vec<CurrencyPair> {
    pairs.sort();
    pairs
}

/// Run every check, each against a store produced by `make_store`.
pub async fn run_all<F, Fut>(make_store: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = SharedStore>,
{
    create_stores_new_request(make_store().await).await;
    create_is_idempotent(make_store().await).await;
    concurrent_create_is_idempotent(make_store().await).await;
    get_by_id_absent_is_none(make_store().await).await;
    uniq_unhandled_deduplicates(make_store().await).await;
    update_completes_only_matching_pair(make_store().await).await;
    update_leaves_completed_requests_untouched(make_store().await).await;
    update_without_pending_is_noop(make_store().await).await;
}

pub async fn create_stores_new_request(store: SharedStore) {
    let request = request(Currency::USD, Currency::EUR);

    let stored = store.create_or_get_by_idempotency_key(&request).await.unwrap();
    assert_eq!(stored, request);

    let fetched = store.get_by_id(request.id()).await.unwrap();
    assert_eq!(fetched, Some(request));
}

pub async fn create_is_idempotent(store: SharedStore) {
    let key = IdempotencyKey::new();
    let first = QuotationRequest::new(Currency::USD, Currency::EUR, key).unwrap();
    let second = QuotationRequest::new(Currency::USD, Currency::EUR, key).unwrap();
    assert_ne!(first.id(), second.id());

    let stored_first = store.create_or_get_by_idempotency_key(&first).await.unwrap();
    let stored_second = store.create_or_get_by_idempotency_key(&second).await.unwrap();

    assert_eq!(stored_first.id(), first.id());
    assert_eq!(stored_second.id(), first.id());
    assert!(store.get_by_id(second.id()).await.unwrap().is_none());
    assert_eq!(
        store.get_uniq_unhandled().await.unwrap(),
        vec![CurrencyPair::new(Currency::USD, Currency::EUR)]
    );
}

pub async fn concurrent_create_is_idempotent(store: SharedStore) {
    let key = IdempotencyKey::new();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let request = QuotationRequest::new(Currency::MXN, Currency::USD, key).unwrap();
                store
                    .create_or_get_by_idempotency_key(&request)
                    .await
                    .unwrap()
                    .id()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }

    assert_eq!(ids.len(), 1, "all submissions must resolve to one request");
    let id = ids.into_iter().next().unwrap();
    assert!(store.get_by_id(id).await.unwrap().is_some());

    // Exactly one row was stored: one pending pair, one request completed.
    let pair = CurrencyPair::new(Currency::MXN, Currency::USD);
    assert_eq!(store.get_uniq_unhandled().await.unwrap(), vec![pair]);
    let updated = store
        .update_by_base_and_quote(pair, "0.05", quotation_common::now())
        .await
        .unwrap();
    assert_eq!(updated, 1);
}

pub async fn get_by_id_absent_is_none(store: SharedStore) {
    let unknown = request(Currency::EUR, Currency::MXN);
    assert!(store.get_by_id(unknown.id()).await.unwrap().is_none());
}

pub async fn uniq_unhandled_deduplicates(store: SharedStore) {
    for _ in 0..3 {
        store
            .create_or_get_by_idempotency_key(&request(Currency::USD, Currency::MXN))
            .await
            .unwrap();
    }
    store
        .create_or_get_by_idempotency_key(&request(Currency::MXN, Currency::EUR))
        .await
        .unwrap();
    store
        .create_or_get_by_idempotency_key(&request(Currency::EUR, Currency::USD))
        .await
        .unwrap();
    store
        .update_by_base_and_quote(
            CurrencyPair::new(Currency::EUR, Currency::USD),
            "1.08",
            quotation_common::now(),
        )
        .await
        .unwrap();

    let pairs = sorted(store.get_uniq_unhandled().await.unwrap());

    assert_eq!(
        pairs,
        sorted(vec![
            CurrencyPair::new(Currency::USD, Currency::MXN),
            CurrencyPair::new(Currency::MXN, Currency::EUR),
        ])
    );
}

pub async fn update_completes_only_matching_pair(store: SharedStore) {
    let usd_mxn_1 = request(Currency::USD, Currency::MXN);
    let usd_mxn_2 = request(Currency::USD, Currency::MXN);
    let mxn_eur = request(Currency::MXN, Currency::EUR);
    let mxn_usd = request(Currency::MXN, Currency::USD);
    for r in [&usd_mxn_1, &usd_mxn_2, &mxn_eur, &mxn_usd] {
        store.create_or_get_by_idempotency_key(r).await.unwrap();
    }

    let at = quotation_common::now();
    let updated = store
        .update_by_base_and_quote(CurrencyPair::new(Currency::USD, Currency::MXN), "20", at)
        .await
        .unwrap();
    assert_eq!(updated, 2);

    for r in [&usd_mxn_1, &usd_mxn_2] {
        let stored = store.get_by_id(r.id()).await.unwrap().unwrap();
        assert_eq!(stored.rate(), Some("20"));
        assert_eq!(stored.completed_at(), Some(at));
    }
    for r in [&mxn_eur, &mxn_usd] {
        let stored = store.get_by_id(r.id()).await.unwrap().unwrap();
        assert!(!stored.is_completed());
        assert!(stored.rate().is_none());
    }
}

pub async fn update_leaves_completed_requests_untouched(store: SharedStore) {
    let pair = CurrencyPair::new(Currency::EUR, Currency::MXN);
    let early = request(pair.base, pair.quote);
    store.create_or_get_by_idempotency_key(&early).await.unwrap();

    let first_at = quotation_common::now();
    store.update_by_base_and_quote(pair, "18.5", first_at).await.unwrap();

    let late = request(pair.base, pair.quote);
    store.create_or_get_by_idempotency_key(&late).await.unwrap();

    let second_at = quotation_common::now();
    let updated = store.update_by_base_and_quote(pair, "18.7", second_at).await.unwrap();
    assert_eq!(updated, 1);

    let early = store.get_by_id(early.id()).await.unwrap().unwrap();
    assert_eq!(early.rate(), Some("18.5"));
    assert_eq!(early.completed_at(), Some(first_at));

    let late = store.get_by_id(late.id()).await.unwrap().unwrap();
    assert_eq!(late.rate(), Some("18.7"));
    assert_eq!(late.completed_at(), Some(second_at));
}

pub async fn update_without_pending_is_noop(store: SharedStore) {
    let updated = store
        .update_by_base_and_quote(
            CurrencyPair::new(Currency::USD, Currency::EUR),
            "0.9",
            quotation_common::now(),
        )
        .await
        .unwrap();

    assert_eq!(updated, 0);
    assert!(store.get_uniq_unhandled().await.unwrap().is_empty());
}
