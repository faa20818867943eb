#![recursion_limit = "256"]

use std::{fmt, future::Future, str::FromStr, sync::Arc, time::Duration};

use redis_connection::{
    CacheHealth, CacheKey, CacheLayer, Cached, InvalidationPlan,
    InvalidationReport, TtlPolicy, TypedCacheKey, cache_key,
};
use tracing::instrument;
use video_responses::{RecommendationsResponse, VideoPage, VideoResponse};

cache_key!(VideoCacheKey::<VideoResponse> => "video"[id: String]);
cache_key!(VideosListCacheKey::<VideoPage> => "videos-list"{params});
cache_key!(SearchCacheKey::<VideoPage> => "search"{params});
cache_key!(TrendingCacheKey::<VideoPage> => "trending"{params});
cache_key!(RecommendationsCacheKey::<RecommendationsResponse> => "recommendations"[user_id: String]);

/// The cached resource families. Each owns one key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Video,
    VideosList,
    Search,
    Trending,
    Recommendations,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Video,
        ResourceKind::VideosList,
        ResourceKind::Search,
        ResourceKind::Trending,
        ResourceKind::Recommendations,
    ];

    pub fn namespace(self) -> &'static str {
        match self {
            ResourceKind::Video => VideoCacheKey::NAMESPACE,
            ResourceKind::VideosList => VideosListCacheKey::NAMESPACE,
            ResourceKind::Search => SearchCacheKey::NAMESPACE,
            ResourceKind::Trending => TrendingCacheKey::NAMESPACE,
            ResourceKind::Recommendations => RecommendationsCacheKey::NAMESPACE,
        }
    }

    pub fn default_ttl(self) -> Duration {
        let secs = match self {
            ResourceKind::Video => 1800,
            ResourceKind::VideosList => 3600,
            ResourceKind::Search => 900,
            ResourceKind::Trending => 600,
            ResourceKind::Recommendations => 1800,
        };
        Duration::from_secs(secs)
    }

    /// Aggregate namespaces that may embed a resource of this kind.
    pub fn sweeps(self) -> &'static [ResourceKind] {
        match self {
            ResourceKind::Video => {
                &[
                    ResourceKind::VideosList,
                    ResourceKind::Trending,
                    ResourceKind::Search,
                    ResourceKind::Recommendations,
                ]
            }
            _ => &[],
        }
    }

    pub fn invalidation_plan(self, id: &str) -> InvalidationPlan {
        self.sweeps().iter().fold(
            InvalidationPlan::new().key(CacheKey::resource(self.namespace(), id)),
            |plan, aggregate| plan.sweep(aggregate.namespace()),
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.namespace() == s)
            .ok_or_else(|| format!("unknown resource kind '{s}'"))
    }
}

/// TTL table for every resource kind; five minutes for anything else.
pub fn video_ttl_policy() -> TtlPolicy {
    ResourceKind::ALL.into_iter().fold(
        TtlPolicy::new(Duration::from_secs(300)),
        |policy, kind| policy.with(kind.namespace(), kind.default_ttl()),
    )
}

/// Video-domain entry points to the cache layer.
#[derive(Clone)]
pub struct VideoCache {
    layer: CacheLayer,
    ttl: Arc<TtlPolicy>,
}

impl VideoCache {
    pub fn new(layer: CacheLayer) -> Self {
        Self::with_policy(layer, video_ttl_policy())
    }

    pub fn with_policy(layer: CacheLayer, ttl: TtlPolicy) -> Self {
        Self {
            layer,
            ttl: Arc::new(ttl),
        }
    }

    pub fn layer(&self) -> &CacheLayer { &self.layer }

    pub fn ttl_policy(&self) -> &TtlPolicy { &self.ttl }

    pub fn ttl_for(&self, kind: ResourceKind) -> Duration {
        self.ttl.ttl_for(kind.namespace())
    }

    /// Read-through for a key family: cached value if present, otherwise the
    /// loader's result, cached for the family's TTL or `ttl_override`.
    #[instrument(skip_all, fields(kind = K::NAMESPACE))]
    pub async fn cache_read<K, E, F, Fut>(
        &self, cache_key: &K, args: K::Args<'_>, loader: F,
        ttl_override: Option<Duration>,
    ) -> Result<Cached<K::Value>, E>
    where
        K: TypedCacheKey,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<K::Value, E>>,
    {
        let ttl = self.ttl.resolve(K::NAMESPACE, ttl_override);
        self.layer.read_typed(cache_key, args, ttl, loader).await
    }

    /// Drops `kind:<id>` and sweeps the aggregates that may embed it.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn invalidate(&self, kind: ResourceKind, id: &str) -> InvalidationReport {
        self.layer.invalidate(&kind.invalidation_plan(id)).await
    }

    pub fn cache_health(&self) -> CacheHealth { self.layer.health() }
}
