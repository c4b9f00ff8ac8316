//! Counters for quotation manager monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::manager::ReconciliationReport;

/// Reconciliation loop metrics.
#[derive(Debug, Default)]
pub struct ManagerMetrics {
    /// Iterations run.
    pub iterations: AtomicU64,
    /// Base-currency groups fetched successfully.
    pub groups_fetched: AtomicU64,
    /// Base-currency groups whose fetch failed or panicked.
    pub groups_failed: AtomicU64,
    /// Pairs persisted and cached.
    pub pairs_resolved: AtomicU64,
    /// Requests completed in the store.
    pub requests_resolved: AtomicU64,
    /// Per-pair store updates that failed.
    pub store_update_failures: AtomicU64,
}

impl ManagerMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one iteration's report into the totals.
    pub fn record_iteration(&self, report: &ReconciliationReport) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        self.groups_fetched
            .fetch_add(report.groups_fetched as u64, Ordering::Relaxed);
        self.groups_failed
            .fetch_add(report.groups_failed as u64, Ordering::Relaxed);
        self.pairs_resolved
            .fetch_add(report.pairs_resolved as u64, Ordering::Relaxed);
        self.requests_resolved
            .fetch_add(report.requests_resolved, Ordering::Relaxed);
        self.store_update_failures
            .fetch_add(report.updates_failed as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            iterations: self.iterations.load(Ordering::Relaxed),
            groups_fetched: self.groups_fetched.load(Ordering::Relaxed),
            groups_failed: self.groups_failed.load(Ordering::Relaxed),
            pairs_resolved: self.pairs_resolved.load(Ordering::Relaxed),
            requests_resolved: self.requests_resolved.load(Ordering::Relaxed),
            store_update_failures: self.store_update_failures.load(Ordering::Relaxed),
        }
    }
}

impl ManagerMetrics {
    /// Export metrics in Prometheus text format.
    ///
    /// `cached_pairs` is the current number of pairs in the rate cache.
    pub fn to_prometheus(&self, cached_pairs: usize) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP quotation_reconcile_iterations_total Reconciliation iterations run
# TYPE quotation_reconcile_iterations_total counter
quotation_reconcile_iterations_total {}

# HELP quotation_rate_groups_fetched_total Base-currency groups fetched from the rate source
# TYPE quotation_rate_groups_fetched_total counter
quotation_rate_groups_fetched_total {}

# HELP quotation_rate_groups_failed_total Base-currency groups whose fetch failed
# TYPE quotation_rate_groups_failed_total counter
quotation_rate_groups_failed_total {}

# HELP quotation_pairs_resolved_total Currency pairs persisted and cached
# TYPE quotation_pairs_resolved_total counter
quotation_pairs_resolved_total {}

# HELP quotation_requests_resolved_total Quotation requests completed
# TYPE quotation_requests_resolved_total counter
quotation_requests_resolved_total {}

# HELP quotation_store_update_failures_total Per-pair store updates that failed
# TYPE quotation_store_update_failures_total counter
quotation_store_update_failures_total {}

# HELP quotation_cached_pairs Currency pairs held in the rate cache
# TYPE quotation_cached_pairs gauge
quotation_cached_pairs {}
"#,
            snapshot.iterations,
            snapshot.groups_fetched,
            snapshot.groups_failed,
            snapshot.pairs_resolved,
            snapshot.requests_resolved,
            snapshot.store_update_failures,
            cached_pairs,
        )
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub iterations: u64,
    pub groups_fetched: u64,
    pub groups_failed: u64,
    pub pairs_resolved: u64,
    pub requests_resolved: u64,
    pub store_update_failures: u64,
}
