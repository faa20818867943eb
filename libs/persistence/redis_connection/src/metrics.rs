use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Hit/miss accounting for the read-through layer.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub populate_failures: AtomicU64,
    pub invalidations: AtomicU64,
    pub keys_swept: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub populate_failures: u64,
    pub invalidations: u64,
    pub keys_swept: u64,
}

impl CacheMetrics {
    pub fn record_hit(&self) { self.hits.fetch_add(1, Ordering::Relaxed); }

    pub fn record_miss(&self) { self.misses.fetch_add(1, Ordering::Relaxed); }

    pub fn record_populate_failure(&self) {
        self.populate_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self, swept: u64) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        self.keys_swept.fetch_add(swept, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            populate_failures: self.populate_failures.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            keys_swept: self.keys_swept.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Share of lookups served from the cache, `0.0` before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = CacheMetrics::default();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_miss();
        metrics.record_invalidation(3);
        metrics.record_invalidation(0);

        let snapshot = metrics.snapshot();

        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 2);
        assert_eq!(snapshot.invalidations, 2);
        assert_eq!(snapshot.keys_swept, 3);
    }

    #[test]
    fn hit_ratio_without_lookups_is_zero() {
        assert_eq!(MetricsSnapshot::default().hit_ratio(), 0.0);
    }
}
