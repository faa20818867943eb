mod config;

use std::net::SocketAddr;

use axum::{Router, routing::get};
use clap::Parser;
use redis_connection::{CacheLayer, CacheStore};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use video_cache_keys::VideoCache;
use video_dao::{VideoDao, seed::sample_videos};
use video_http::VideoServices;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::parse();

    info!("Connecting cache backend: {}", config.cache_backend);
    let store =
        CacheStore::from_kind(config.cache_backend, &config.redis(), &config.memory())
            .await;
    if store.is_connected() {
        info!("Cache backend ready");
    }
    else {
        warn!("Cache unavailable, serving every request from the source");
    }

    let video_dao = if config.seed_sample_videos {
        info!("Seeding sample videos");
        VideoDao::with_videos(sample_videos())
    }
    else {
        VideoDao::new()
    };

    let cache = VideoCache::new(CacheLayer::new(store.clone()));
    let services = VideoServices::new(video_dao, cache)
        .with_admin_token(config.admin_token.clone());
    if services.admin_token().is_none() {
        warn!("ADMIN_TOKEN not set, admin cache routes are disabled");
    }

    let app = Router::new()
        .merge(video_http::router(services))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/docs"))
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Video server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        video_http::admin::health_check,
        video_http::list_videos,
        video_http::trending_videos,
        video_http::search_videos,
        video_http::get_video,
        video_http::publish_video,
        video_http::update_video,
        video_http::delete_video,
        video_http::toggle_like,
        video_http::get_recommendations,
        video_http::record_feedback,
        video_http::admin::cache_stats,
        video_http::admin::evict_video,
        video_http::admin::flush_cache
    ),
    components(
        schemas(
            video_responses::VideoResponse,
            video_responses::VideoPage,
            video_responses::Pagination,
            video_responses::LikeResponse,
            video_responses::RecommendationsResponse,
            video_responses::MessageResponse,
            video_commands::PublishVideoCommand,
            video_commands::UpdateVideoCommand,
            video_commands::ToggleLikeCommand,
            video_commands::RecordFeedbackCommand,
            video_http::admin::HealthResponse,
            video_http::admin::CacheEvictionResponse,
            video_http::admin::CacheFlushResponse,
            common_errors::ApiErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "videos", description = "Video catalog endpoints"),
        (name = "recommendations", description = "Per-viewer recommendations"),
        (name = "cache", description = "Cache administration endpoints")
    ),
    info(
        title = "Video Cache API",
        description = "Video API served through a read-through cache",
        version = "1.0.0"
    )
)]
struct ApiDoc;
