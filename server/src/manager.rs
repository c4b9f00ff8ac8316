//! Quotation manager: the rate cache plus the reconciliation loop.
//!
//! One iteration asks the store for the pairs that still have pending
//! requests, groups them by base currency and fetches every group from the
//! rate source in parallel. Each returned rate is written to the store first
//! and to the cache second. A failed group or a failed store update is logged
//! and skipped; the pairs stay pending and the next iteration retries them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use quotation_common::{Currency, CurrencyPair, Timestamp};
use quotation_fx::SharedRateSource;
use quotation_store::SharedStore;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{QuotationCache, QuotationInfo};
use crate::error::ManagerError;
use crate::metrics::{ManagerMetrics, MetricsSnapshot};
use crate::state::ManagerState;

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Target period of the reconciliation loop.
    pub poll_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
        }
    }
}

/// What one reconciliation iteration did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Distinct pending pairs found in the store.
    pub pairs_seen: usize,
    /// Base-currency groups fetched successfully.
    pub groups_fetched: usize,
    /// Base-currency groups skipped because the fetch failed.
    pub groups_failed: usize,
    /// Pairs written to the store and the cache.
    pub pairs_resolved: usize,
    /// Requests completed in the store.
    pub requests_resolved: u64,
    /// Pairs skipped because the store update failed.
    pub updates_failed: usize,
}

#[derive(Debug, Default)]
struct GroupOutcome {
    fetched: bool,
    pairs_resolved: usize,
    requests_resolved: u64,
    updates_failed: usize,
}

impl ReconciliationReport {
    fn absorb(&mut self, outcome: GroupOutcome) {
        if outcome.fetched {
            self.groups_fetched += 1;
        } else {
            self.groups_failed += 1;
        }
        self.pairs_resolved += outcome.pairs_resolved;
        self.requests_resolved += outcome.requests_resolved;
        self.updates_failed += outcome.updates_failed;
    }
}

struct LoopHandle {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Group pairs by base currency, keeping the first-seen order of quotes.
pub fn group_currency_pairs(pairs: &[CurrencyPair]) -> BTreeMap<Currency, Vec<Currency>> {
    let mut groups: BTreeMap<Currency, Vec<Currency>> = BTreeMap::new();

    for pair in pairs {
        let quotes = groups.entry(pair.base).or_default();
        if !quotes.contains(&pair.quote) {
            quotes.push(pair.quote);
        }
    }

    groups
}

/// Owns the rate cache and drives pending requests to completion.
pub struct QuotationManager {
    config: ManagerConfig,
    store: SharedStore,
    rate_source: SharedRateSource,
    cache: QuotationCache,
    metrics: ManagerMetrics,
    state: RwLock<ManagerState>,
    worker: Mutex<Option<LoopHandle>>,
}

impl QuotationManager {
    /// Create a manager; the loop is not started.
    pub fn new(config: ManagerConfig, store: SharedStore, rate_source: SharedRateSource) -> Self {
        Self {
            config,
            store,
            rate_source,
            cache: QuotationCache::new(),
            metrics: ManagerMetrics::new(),
            state: RwLock::new(ManagerState::Idle),
            worker: Mutex::new(None),
        }
    }

    /// Last known quotation for `pair`, `None` if never resolved.
    pub fn get_quotation(&self, pair: &CurrencyPair) -> Option<QuotationInfo> {
        self.cache.get(pair)
    }

    /// Overwrite the cached quotation for `pair`.
    pub fn update_quotation(&self, pair: CurrencyPair, rate: impl Into<String>, updated_at: Timestamp) {
        self.cache.update(pair, QuotationInfo::new(rate, updated_at));
    }

    /// Get the current manager state.
    pub fn state(&self) -> ManagerState {
        *self.state.read()
    }

    /// Get a snapshot of the loop counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Loop counters and cache size in Prometheus text format.
    pub fn prometheus_metrics(&self) -> String {
        self.metrics.to_prometheus(self.cache.len())
    }

    /// Spawn the reconciliation loop.
    #[instrument(skip(self))]
    pub fn start(self: &Arc<Self>) -> Result<(), ManagerError> {
        let mut worker = self.worker.lock();
        match *self.state.read() {
            ManagerState::Stopping => return Err(ManagerError::Stopping),
            state if !state.can_start() || worker.is_some() => {
                return Err(ManagerError::AlreadyRunning)
            }
            _ => {}
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move { manager.run_loop(shutdown_rx).await });

        *worker = Some(LoopHandle {
            shutdown_tx,
            handle,
        });
        *self.state.write() = ManagerState::Running;

        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            source = self.rate_source.name(),
            "Quotation manager started"
        );
        Ok(())
    }

    /// Signal the loop and wait until the in-flight iteration has finished.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), ManagerError> {
        // Stopping is set under the worker lock and held until the loop exits.
        let worker = {
            let mut worker = self.worker.lock();
            let taken = worker.take().ok_or(ManagerError::NotRunning)?;
            *self.state.write() = ManagerState::Stopping;
            taken
        };

        info!("Stopping quotation manager");

        let _ = worker.shutdown_tx.send(()).await;
        if let Err(e) = worker.handle.await {
            error!(error = %e, "Reconciliation loop ended abnormally");
        }

        *self.state.write() = ManagerState::Stopped;
        info!("Quotation manager stopped");
        Ok(())
    }

    async fn run_loop(self: Arc<Self>, mut shutdown_rx: mpsc::Receiver<()>) {
        loop {
            let started = Instant::now();
            self.reconcile_once().await;

            // An overlong iteration is followed immediately by the next one.
            let wait = self.config.poll_interval.saturating_sub(started.elapsed());

            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        debug!("Reconciliation loop exited");
    }

    /// Run one reconciliation iteration.
    ///
    /// Returns once every base-currency group has finished.
    #[instrument(skip(self))]
    pub async fn reconcile_once(self: &Arc<Self>) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();

        let pairs = match self.store.get_uniq_unhandled().await {
            Ok(pairs) => pairs,
            Err(e) => {
                error!(error = %e, "Failed to load unhandled currency pairs");
                self.metrics.record_iteration(&report);
                return report;
            }
        };

        report.pairs_seen = pairs.len();
        if pairs.is_empty() {
            self.metrics.record_iteration(&report);
            return report;
        }

        let mut groups = JoinSet::new();
        for (base, quotes) in group_currency_pairs(&pairs) {
            let manager = Arc::clone(self);
            groups.spawn(async move { manager.process_group(base, quotes).await });
        }

        while let Some(joined) = groups.join_next().await {
            match joined {
                Ok(outcome) => report.absorb(outcome),
                Err(e) => {
                    error!(error = %e, "Currency group task failed");
                    report.groups_failed += 1;
                }
            }
        }

        self.metrics.record_iteration(&report);

        info!(
            pairs = report.pairs_seen,
            pairs_resolved = report.pairs_resolved,
            requests_resolved = report.requests_resolved,
            groups_failed = report.groups_failed,
            updates_failed = report.updates_failed,
            "Reconciliation iteration finished"
        );

        report
    }

    #[instrument(skip(self, quotes), fields(base = %base, quotes = quotes.len()))]
    async fn process_group(&self, base: Currency, quotes: Vec<Currency>) -> GroupOutcome {
        let mut outcome = GroupOutcome::default();

        let rates = match self.rate_source.get_latest_rates(base, &quotes).await {
            Ok(rates) => rates,
            Err(e) => {
                warn!(
                    source = self.rate_source.name(),
                    error = %e,
                    retryable = e.is_retryable(),
                    "Failed to fetch rates, skipping currency group"
                );
                return outcome;
            }
        };
        outcome.fetched = true;

        for rate in rates {
            let pair = CurrencyPair::new(base, rate.quote);
            let value = rate.rate_string();

            match self
                .store
                .update_by_base_and_quote(pair, &value, rate.observed_at)
                .await
            {
                Ok(updated) => {
                    debug!(pair = %pair, rate = %value, updated, "Quotation resolved");
                    self.update_quotation(pair, value, rate.observed_at);
                    outcome.pairs_resolved += 1;
                    outcome.requests_resolved += updated;
                }
                Err(e) => {
                    error!(pair = %pair, error = %e, "Failed to persist rate, skipping currency");
                    outcome.updates_failed += 1;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quotation_common::{IdempotencyKey, QuotationRequest, RequestId};
    use quotation_fx::MockRateSource;
    use quotation_store::{
        InMemoryQuotationStore, QuotationRequestStore, StoreError, StoreResult,
    };
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<InMemoryQuotationStore>,
        source: Arc<MockRateSource>,
        manager: Arc<QuotationManager>,
    }

    fn fixture_with(poll_interval: Duration) -> Fixture {
        let store = Arc::new(InMemoryQuotationStore::new());
        let source = Arc::new(MockRateSource::new());
        source.set_rate(Currency::USD, Currency::MXN, dec!(20));
        source.set_rate(Currency::USD, Currency::EUR, dec!(1.1));
        source.set_rate(Currency::MXN, Currency::EUR, dec!(0.05));

        let manager = Arc::new(QuotationManager::new(
            ManagerConfig { poll_interval },
            store.clone(),
            source.clone(),
        ));

        Fixture {
            store,
            source,
            manager,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Duration::from_millis(1000))
    }

    async fn submit(store: &InMemoryQuotationStore, base: Currency, quote: Currency) -> RequestId {
        let request = QuotationRequest::new(base, quote, IdempotencyKey::new()).unwrap();
        store
            .create_or_get_by_idempotency_key(&request)
            .await
            .unwrap()
            .id()
    }

    async fn stored(store: &InMemoryQuotationStore, id: RequestId) -> QuotationRequest {
        store.get_by_id(id).await.unwrap().unwrap()
    }

    fn pair(base: Currency, quote: Currency) -> CurrencyPair {
        CurrencyPair::new(base, quote)
    }

    /// Store that refuses to update one pair.
    struct FailingUpdateStore {
        inner: InMemoryQuotationStore,
        failing: CurrencyPair,
    }

    #[async_trait]
    impl QuotationRequestStore for FailingUpdateStore {
        async fn create_or_get_by_idempotency_key(
            &self,
            request: &QuotationRequest,
        ) -> StoreResult<QuotationRequest> {
            self.inner.create_or_get_by_idempotency_key(request).await
        }

        async fn get_by_id(&self, id: RequestId) -> StoreResult<Option<QuotationRequest>> {
            self.inner.get_by_id(id).await
        }

        async fn update_by_base_and_quote(
            &self,
            pair: CurrencyPair,
            rate: &str,
            completed_at: Timestamp,
        ) -> StoreResult<u64> {
            if pair == self.failing {
                return Err(StoreError::Database("connection reset".to_string()));
            }
            self.inner.update_by_base_and_quote(pair, rate, completed_at).await
        }

        async fn get_uniq_unhandled(&self) -> StoreResult<Vec<CurrencyPair>> {
            self.inner.get_uniq_unhandled().await
        }
    }

    /// Store that records when each iteration asks for pending pairs.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryQuotationStore,
        polls: Mutex<Vec<Instant>>,
    }

    impl RecordingStore {
        fn polls(&self) -> Vec<Instant> {
            self.polls.lock().clone()
        }

        async fn wait_for_polls(&self, count: usize) {
            while self.polls.lock().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    }

    #[async_trait]
    impl QuotationRequestStore for RecordingStore {
        async fn create_or_get_by_idempotency_key(
            &self,
            request: &QuotationRequest,
        ) -> StoreResult<QuotationRequest> {
            self.inner.create_or_get_by_idempotency_key(request).await
        }

        async fn get_by_id(&self, id: RequestId) -> StoreResult<Option<QuotationRequest>> {
            self.inner.get_by_id(id).await
        }

        async fn update_by_base_and_quote(
            &self,
            pair: CurrencyPair,
            rate: &str,
            completed_at: Timestamp,
        ) -> StoreResult<u64> {
            self.inner.update_by_base_and_quote(pair, rate, completed_at).await
        }

        async fn get_uniq_unhandled(&self) -> StoreResult<Vec<CurrencyPair>> {
            self.polls.lock().push(Instant::now());
            self.inner.get_uniq_unhandled().await
        }
    }

    fn recording_manager(
        poll_interval: Duration,
        usd_delay: Duration,
    ) -> (Arc<RecordingStore>, Arc<QuotationManager>) {
        let store = Arc::new(RecordingStore::default());
        let source = Arc::new(MockRateSource::new());
        source.set_rate(Currency::USD, Currency::MXN, dec!(20));
        source.delay_base(Currency::USD, usd_delay);

        let manager = Arc::new(QuotationManager::new(
            ManagerConfig { poll_interval },
            store.clone(),
            source,
        ));
        (store, manager)
    }

    #[test]
    fn test_group_currency_pairs() {
        let groups = group_currency_pairs(&[
            pair(Currency::USD, Currency::MXN),
            pair(Currency::MXN, Currency::EUR),
            pair(Currency::USD, Currency::EUR),
            pair(Currency::USD, Currency::MXN),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&Currency::USD], vec![Currency::MXN, Currency::EUR]);
        assert_eq!(groups[&Currency::MXN], vec![Currency::EUR]);
        assert!(group_currency_pairs(&[]).is_empty());
    }

    #[test]
    fn test_get_and_update_quotation() {
        let f = fixture();
        let usd_mxn = pair(Currency::USD, Currency::MXN);
        assert!(f.manager.get_quotation(&usd_mxn).is_none());

        let at = quotation_common::now();
        f.manager.update_quotation(usd_mxn, "20", at);
        f.manager.update_quotation(usd_mxn, "21", at);

        assert_eq!(f.manager.get_quotation(&usd_mxn), Some(QuotationInfo::new("21", at)));
        assert!(f.manager.get_quotation(&usd_mxn.inverse()).is_none());
    }

    #[tokio::test]
    async fn test_reconcile_resolves_pending_requests() {
        let f = fixture();
        let first = submit(&f.store, Currency::USD, Currency::MXN).await;
        let second = submit(&f.store, Currency::USD, Currency::MXN).await;
        let third = submit(&f.store, Currency::MXN, Currency::EUR).await;

        let report = f.manager.reconcile_once().await;

        assert_eq!(
            report,
            ReconciliationReport {
                pairs_seen: 2,
                groups_fetched: 2,
                groups_failed: 0,
                pairs_resolved: 2,
                requests_resolved: 3,
                updates_failed: 0,
            }
        );
        assert_eq!(stored(&f.store, first).await.rate(), Some("20"));
        assert_eq!(stored(&f.store, second).await.rate(), Some("20"));
        assert_eq!(stored(&f.store, third).await.rate(), Some("0.05"));

        let cached = f.manager.get_quotation(&pair(Currency::USD, Currency::MXN)).unwrap();
        assert_eq!(cached.rate, "20");
        assert_eq!(Some(cached.updated_at), stored(&f.store, first).await.completed_at());
        assert_eq!(
            f.manager.get_quotation(&pair(Currency::MXN, Currency::EUR)).unwrap().rate,
            "0.05"
        );
        // Only requested quotes are fetched and cached.
        assert!(f.manager.get_quotation(&pair(Currency::USD, Currency::EUR)).is_none());

        let mut calls = f.source.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                (Currency::USD, vec![Currency::MXN]),
                (Currency::MXN, vec![Currency::EUR]),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_group_is_skipped() {
        let f = fixture();
        f.source.fail_base(Currency::USD);
        let usd_mxn = submit(&f.store, Currency::USD, Currency::MXN).await;
        let mxn_eur = submit(&f.store, Currency::MXN, Currency::EUR).await;

        let report = f.manager.reconcile_once().await;

        assert_eq!(report.groups_fetched, 1);
        assert_eq!(report.groups_failed, 1);
        assert!(!stored(&f.store, usd_mxn).await.is_completed());
        assert_eq!(stored(&f.store, mxn_eur).await.rate(), Some("0.05"));
        assert!(f.manager.get_quotation(&pair(Currency::USD, Currency::MXN)).is_none());

        f.source.recover_base(Currency::USD);
        let report = f.manager.reconcile_once().await;

        assert_eq!(report.pairs_seen, 1);
        assert_eq!(report.requests_resolved, 1);
        assert_eq!(stored(&f.store, usd_mxn).await.rate(), Some("20"));
    }

    #[tokio::test]
    async fn test_store_update_failure_skips_only_that_currency() {
        let store = Arc::new(FailingUpdateStore {
            inner: InMemoryQuotationStore::new(),
            failing: pair(Currency::USD, Currency::MXN),
        });
        let source = Arc::new(MockRateSource::new());
        source.set_rate(Currency::USD, Currency::MXN, dec!(20));
        source.set_rate(Currency::USD, Currency::EUR, dec!(1.1));
        let manager = Arc::new(QuotationManager::new(
            ManagerConfig::default(),
            store.clone(),
            source,
        ));

        let usd_mxn = submit(&store.inner, Currency::USD, Currency::MXN).await;
        let usd_eur = submit(&store.inner, Currency::USD, Currency::EUR).await;

        let report = manager.reconcile_once().await;

        assert_eq!(report.groups_fetched, 1);
        assert_eq!(report.pairs_resolved, 1);
        assert_eq!(report.updates_failed, 1);
        assert!(!stored(&store.inner, usd_mxn).await.is_completed());
        assert_eq!(stored(&store.inner, usd_eur).await.rate(), Some("1.1"));
        assert!(manager.get_quotation(&pair(Currency::USD, Currency::MXN)).is_none());
        assert_eq!(manager.metrics().store_update_failures, 1);
    }

    #[tokio::test]
    async fn test_reconcile_without_pending_requests_is_noop() {
        let f = fixture();
        submit(&f.store, Currency::USD, Currency::MXN).await;
        f.manager.reconcile_once().await;

        let calls = f.source.call_count();
        let cached = f.manager.get_quotation(&pair(Currency::USD, Currency::MXN));

        let report = f.manager.reconcile_once().await;

        assert_eq!(report, ReconciliationReport::default());
        assert_eq!(f.source.call_count(), calls);
        assert_eq!(f.manager.get_quotation(&pair(Currency::USD, Currency::MXN)), cached);
        assert_eq!(f.manager.metrics().iterations, 2);
    }

    #[tokio::test]
    async fn test_later_rate_overwrites_cache_but_not_completed_requests() {
        let f = fixture();
        let early = submit(&f.store, Currency::USD, Currency::MXN).await;
        f.manager.reconcile_once().await;

        f.source.set_rate(Currency::USD, Currency::MXN, dec!(20.5));
        let late = submit(&f.store, Currency::USD, Currency::MXN).await;
        f.manager.reconcile_once().await;

        assert_eq!(stored(&f.store, early).await.rate(), Some("20"));
        assert_eq!(stored(&f.store, late).await.rate(), Some("20.5"));
        assert_eq!(
            f.manager.get_quotation(&pair(Currency::USD, Currency::MXN)).unwrap().rate,
            "20.5"
        );
    }

    #[tokio::test]
    async fn test_groups_are_fetched_in_parallel() {
        let f = fixture();
        f.source.delay_base(Currency::USD, Duration::from_millis(300));
        f.source.delay_base(Currency::MXN, Duration::from_millis(300));
        submit(&f.store, Currency::USD, Currency::MXN).await;
        submit(&f.store, Currency::MXN, Currency::EUR).await;

        let started = Instant::now();
        let report = f.manager.reconcile_once().await;

        assert_eq!(report.groups_fetched, 2);
        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let f = fixture();
        assert_eq!(f.manager.state(), ManagerState::Idle);

        f.manager.start().unwrap();
        assert_eq!(f.manager.state(), ManagerState::Running);
        assert_eq!(f.manager.start(), Err(ManagerError::AlreadyRunning));

        f.manager.stop().await.unwrap();
        assert_eq!(f.manager.state(), ManagerState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_without_start_is_rejected() {
        let f = fixture();
        assert_eq!(f.manager.stop().await, Err(ManagerError::NotRunning));
    }

    #[tokio::test]
    async fn test_loop_resolves_requests_until_stopped() {
        let f = fixture_with(Duration::from_millis(20));
        f.manager.start().unwrap();

        let id = submit(&f.store, Currency::EUR, Currency::MXN).await;
        f.source.set_rate(Currency::EUR, Currency::MXN, dec!(18.25));

        let mut resolved = false;
        for _ in 0..100 {
            if stored(&f.store, id).await.is_completed() {
                resolved = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(resolved, "loop did not resolve the request");
        assert_eq!(stored(&f.store, id).await.rate(), Some("18.25"));

        f.manager.stop().await.unwrap();
        assert!(f.manager.metrics().iterations >= 1);

        let after_stop = submit(&f.store, Currency::EUR, Currency::MXN).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!stored(&f.store, after_stop).await.is_completed());
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_iteration() {
        let f = fixture_with(Duration::from_millis(10));
        f.source.delay_base(Currency::USD, Duration::from_millis(200));
        let id = submit(&f.store, Currency::USD, Currency::MXN).await;

        f.manager.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        f.manager.stop().await.unwrap();

        assert_eq!(stored(&f.store, id).await.rate(), Some("20"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_during_shutdown_is_rejected() {
        let f = fixture_with(Duration::from_millis(10));
        f.source.delay_base(Currency::USD, Duration::from_millis(300));
        let id = submit(&f.store, Currency::USD, Currency::MXN).await;

        f.manager.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let manager = Arc::clone(&f.manager);
        let stopping = tokio::spawn(async move { manager.stop().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(f.manager.state(), ManagerState::Stopping);
        assert_eq!(f.manager.start(), Err(ManagerError::Stopping));
        assert_eq!(f.manager.stop().await, Err(ManagerError::NotRunning));

        stopping.await.unwrap().unwrap();
        assert_eq!(f.manager.state(), ManagerState::Stopped);
        assert_eq!(stored(&f.store, id).await.rate(), Some("20"));

        let iterations = f.manager.metrics().iterations;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(f.manager.metrics().iterations, iterations);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlong_iteration_is_followed_immediately() {
        let (store, manager) =
            recording_manager(Duration::from_millis(100), Duration::from_millis(250));
        submit(&store.inner, Currency::USD, Currency::MXN).await;

        manager.start().unwrap();
        store.wait_for_polls(3).await;
        manager.stop().await.unwrap();

        let polls = store.polls();
        // First iteration waits on the slow fetch, the second starts right away.
        let gap = polls[1] - polls[0];
        assert!(gap >= Duration::from_millis(250) && gap < Duration::from_millis(260));
        // The second iteration has nothing to do and waits out a full interval.
        let gap = polls[2] - polls[1];
        assert!(gap >= Duration::from_millis(100) && gap < Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_iteration_waits_out_the_interval() {
        let (store, manager) =
            recording_manager(Duration::from_millis(100), Duration::from_millis(30));
        submit(&store.inner, Currency::USD, Currency::MXN).await;

        manager.start().unwrap();
        store.wait_for_polls(2).await;
        manager.stop().await.unwrap();

        let polls = store.polls();
        let gap = polls[1] - polls[0];
        assert!(gap >= Duration::from_millis(100) && gap < Duration::from_millis(110));
    }

    #[tokio::test]
    async fn test_manager_can_be_restarted() {
        let f = fixture_with(Duration::from_millis(10));

        f.manager.start().unwrap();
        f.manager.stop().await.unwrap();
        f.manager.start().unwrap();
        assert!(f.manager.state().is_running());
        f.manager.stop().await.unwrap();
    }
}
