use std::sync::Arc;

use serde::Serialize;

use crate::{
    config::BackendKind,
    metrics::{CacheMetrics, MetricsSnapshot},
    store::{CacheStore, StoreStats},
};

/// The store handle plus the accounting shared by every caching path.
///
/// Constructed once at startup and cloned into whatever needs caching.
#[derive(Clone)]
pub struct CacheLayer {
    store: CacheStore,
    metrics: Arc<CacheMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHealth {
    pub connected: bool,
    pub backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    #[serde(flatten)]
    pub store: StoreStats,
    pub metrics: MetricsSnapshot,
    pub hit_ratio: f64,
}

impl CacheLayer {
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn store(&self) -> &CacheStore { &self.store }

    pub fn metrics(&self) -> &CacheMetrics { &self.metrics }

    pub fn health(&self) -> CacheHealth {
        let connectivity = self.store.connectivity();
        CacheHealth {
            connected: connectivity.connected,
            backend: self.store.backend_kind(),
            last_error: connectivity.last_error,
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let metrics = self.metrics.snapshot();
        CacheStats {
            store: self.store.stats().await,
            hit_ratio: metrics.hit_ratio(),
            metrics,
        }
    }
}
