use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{core::CacheKey, layer::CacheLayer};

/// The keys a mutation makes stale: direct keys to delete and namespaces to
/// sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    keys: Vec<CacheKey>,
    prefixes: Vec<String>,
}

impl InvalidationPlan {
    pub fn new() -> Self { Self::default() }

    pub fn key(mut self, key: CacheKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Sweeps every key under `namespace`.
    pub fn sweep(mut self, namespace: &str) -> Self {
        self.prefixes.push(CacheKey::namespace_prefix(namespace));
        self
    }

    pub fn keys(&self) -> &[CacheKey] { &self.keys }

    pub fn prefixes(&self) -> &[String] { &self.prefixes }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.prefixes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationReport {
    pub keys_deleted: u64,
    pub keys_swept: u64,
}

impl CacheLayer {
    /// Best effort. Runs after the write it follows has succeeded; a store
    /// failure here is logged by the adapter and otherwise ignored.
    #[instrument(skip_all, fields(keys = plan.keys.len(), prefixes = plan.prefixes.len()))]
    pub async fn invalidate(&self, plan: &InvalidationPlan) -> InvalidationReport {
        if !self.store().is_connected() {
            debug!("cache unavailable, skipping invalidation");
            return InvalidationReport::default();
        }

        let mut report = InvalidationReport::default();
        for key in &plan.keys {
            if self.store().delete(key.as_str()).await {
                report.keys_deleted += 1;
            }
        }
        for prefix in &plan.prefixes {
            report.keys_swept += self.store().delete_by_prefix(prefix).await;
        }

        self.metrics()
            .record_invalidation(report.keys_deleted + report.keys_swept);
        info!(
            keys_deleted = report.keys_deleted,
            keys_swept = report.keys_swept,
            "cache invalidated"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{config::MemoryConfig, core::CacheParams, store::CacheStore};

    async fn seeded() -> CacheLayer {
        let layer = CacheLayer::new(CacheStore::memory(&MemoryConfig::default()));
        let ttl = Duration::from_secs(60);
        let page = |n: &str| CacheParams::new().with("page", n);
        let keys = [
            CacheKey::resource("video", "v1"),
            CacheKey::resource("video", "v2"),
            CacheKey::params("videos-list", &page("1")),
            CacheKey::params("videos-list", &page("2")),
            CacheKey::params("trending", &CacheParams::new()),
        ];
        for key in &keys {
            layer.populate(key, &"cached", ttl).await;
        }
        layer
    }

    #[tokio::test]
    async fn deletes_direct_key_and_sweeps_lists() {
        let layer = seeded().await;
        let plan = InvalidationPlan::new()
            .key(CacheKey::resource("video", "v1"))
            .sweep("videos-list");

        let report = layer.invalidate(&plan).await;

        assert_eq!(report, InvalidationReport {
            keys_deleted: 1,
            keys_swept: 2,
        });
        let store = layer.store();
        assert_eq!(store.get("video:v1").await, None);
        assert_eq!(store.get(r#"videos-list:{"page":"1"}"#).await, None);
        assert!(store.get("video:v2").await.is_some());
        assert!(store.get("trending:{}").await.is_some());
    }

    #[tokio::test]
    async fn missing_keys_are_tolerated() {
        let layer = seeded().await;
        let plan = InvalidationPlan::new()
            .key(CacheKey::resource("video", "nope"))
            .sweep("search");

        let report = layer.invalidate(&plan).await;

        assert_eq!(report, InvalidationReport::default());
        assert_eq!(layer.metrics().snapshot().invalidations, 1);
    }

    #[tokio::test]
    async fn disabled_store_skips_invalidation() {
        let layer = CacheLayer::new(CacheStore::disabled());
        let plan = InvalidationPlan::new().key(CacheKey::resource("video", "v1"));

        assert_eq!(layer.invalidate(&plan).await, InvalidationReport::default());
        assert_eq!(layer.metrics().snapshot().invalidations, 0);
    }
}
