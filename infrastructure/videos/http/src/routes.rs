use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use cache_middleware::{RouteCache, RouteCachePolicy, read_through_layer};
use video_cache_keys::ResourceKind;

use crate::{VideoServices, admin};

const LIST_FIELDS: &[&str] = &["page", "limit", "category", "search"];
const TRENDING_FIELDS: &[&str] = &["page", "limit"];
const SEARCH_FIELDS: &[&str] = &["page", "limit", "category", "sortBy"];

fn route_cache(
    services: &VideoServices, kind: ResourceKind, fields: &'static [&'static str],
) -> RouteCache {
    RouteCache::new(
        services.cache.layer().clone(),
        RouteCachePolicy::params(kind.namespace(), services.cache.ttl_for(kind))
            .with_query_fields(fields),
    )
}

/// Every video, recommendation, health and cache-admin route.
///
/// Aggregate listings are cached by the route middleware; single videos
/// and recommendations go through the read-through wrapper in their
/// handlers.
pub fn router(services: VideoServices) -> Router {
    let videos_list = route_cache(&services, ResourceKind::VideosList, LIST_FIELDS);
    let trending = route_cache(&services, ResourceKind::Trending, TRENDING_FIELDS);
    let search = route_cache(&services, ResourceKind::Search, SEARCH_FIELDS);

    Router::new()
        .route("/health", get(admin::health_check))
        .route(
            "/api/videos",
            get(crate::list_videos).layer(from_fn_with_state(videos_list, read_through_layer)),
        )
        .route("/api/videos", post(crate::publish_video))
        .route(
            "/api/videos/trending",
            get(crate::trending_videos).layer(from_fn_with_state(trending, read_through_layer)),
        )
        .route(
            "/api/videos/search/{query}",
            get(crate::search_videos).layer(from_fn_with_state(search, read_through_layer)),
        )
        .route("/api/videos/{id}", get(crate::get_video))
        .route("/api/videos/{id}", put(crate::update_video))
        .route("/api/videos/{id}", delete(crate::delete_video))
        .route("/api/videos/{id}/like", post(crate::toggle_like))
        .route(
            "/api/recommendations/{userId}",
            get(crate::get_recommendations),
        )
        .route(
            "/api/recommendations/{userId}/feedback",
            post(crate::record_feedback),
        )
        .route("/api/admin/cache-stats", get(admin::cache_stats))
        .route("/api/admin/cache/videos/{id}", delete(admin::evict_video))
        .route("/api/admin/cache/flush", post(admin::flush_cache))
        .with_state(services)
}
