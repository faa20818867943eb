pub mod redis;

use std::sync::Once;

use redis_connection::{CacheLayer, CacheStore, MemoryConfig};
pub use redis::{TestRedisContainer, unreachable_redis_config};
use tracing_subscriber::EnvFilter;
use video_cache_keys::VideoCache;
use video_dao::{VideoDao, seed::sample_videos};

static TRACING: Once = Once::new();

/// Test log output, filtered by `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn memory_layer() -> CacheLayer {
    CacheLayer::new(CacheStore::memory(&MemoryConfig::default()))
}

pub fn memory_video_cache() -> VideoCache { VideoCache::new(memory_layer()) }

/// A cache whose store never came up.
pub async fn passthrough_video_cache() -> VideoCache {
    let store = CacheStore::connect(&unreachable_redis_config()).await;
    VideoCache::new(CacheLayer::new(store))
}

/// DAO holding the sample catalog (`v1`..`v8`, all approved).
pub fn seeded_dao() -> VideoDao { VideoDao::with_videos(sample_videos()) }

pub fn sample_video(id: &str) -> video_models::Video {
    sample_videos()
        .into_iter()
        .find(|video| video.id == id)
        .unwrap_or_else(|| panic!("no sample video {id}"))
}
