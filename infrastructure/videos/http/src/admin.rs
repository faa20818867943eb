//! Health and cache administration.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use common_errors::AppError;
use redis_connection::{CacheHealth, CacheKey, CacheStats};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use video_cache_keys::ResourceKind;

use crate::VideoServices;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[schema(value_type = Object)]
    pub cache: CacheHealth,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheEvictionResponse {
    pub key: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CacheFlushResponse {
    pub flushed: bool,
}

fn authorize(services: &VideoServices, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = services.admin_token()
    else {
        return Err(AppError::forbidden(
            "ADMIN_DISABLED",
            "Admin endpoints are disabled",
        ));
    };

    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented == Some(expected) {
        Ok(())
    }
    else {
        Err(AppError::forbidden("INVALID_ADMIN_TOKEN", "Invalid admin token"))
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up; reports cache connectivity", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(services): State<VideoServices>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        cache: services.cache.cache_health(),
    })
}

#[utoipa::path(
    get,
    path = "/api/admin/cache-stats",
    params(
        ("x-admin-token" = String, Header, description = "Admin token")
    ),
    responses(
        (status = 200, description = "Store status, key count and hit/miss counters"),
        (status = 403, description = "Missing or wrong admin token", body = common_errors::ApiErrorResponse)
    ),
    tag = "cache"
)]
#[instrument(skip_all)]
pub async fn cache_stats(
    State(services): State<VideoServices>, headers: HeaderMap,
) -> Result<Json<CacheStats>, AppError> {
    authorize(&services, &headers)?;

    Ok(Json(services.cache.layer().stats().await))
}

#[utoipa::path(
    delete,
    path = "/api/admin/cache/videos/{id}",
    params(
        ("id" = String, Path, description = "Video ID"),
        ("x-admin-token" = String, Header, description = "Admin token")
    ),
    responses(
        (status = 200, description = "Cached video entry removed", body = CacheEvictionResponse),
        (status = 403, description = "Missing or wrong admin token", body = common_errors::ApiErrorResponse)
    ),
    tag = "cache"
)]
#[instrument(skip_all)]
pub async fn evict_video(
    State(services): State<VideoServices>, Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CacheEvictionResponse>, AppError> {
    authorize(&services, &headers)?;

    let key = CacheKey::resource(ResourceKind::Video.namespace(), &id);
    let deleted = services.cache.layer().store().delete(key.as_str()).await;
    tracing::info!("Evicted {key}: {deleted}");

    Ok(Json(CacheEvictionResponse {
        key: key.to_string(),
        deleted,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/cache/flush",
    params(
        ("x-admin-token" = String, Header, description = "Admin token")
    ),
    responses(
        (status = 200, description = "Every cached entry removed", body = CacheFlushResponse),
        (status = 403, description = "Missing or wrong admin token", body = common_errors::ApiErrorResponse)
    ),
    tag = "cache"
)]
#[instrument(skip_all)]
pub async fn flush_cache(
    State(services): State<VideoServices>, headers: HeaderMap,
) -> Result<Json<CacheFlushResponse>, AppError> {
    authorize(&services, &headers)?;

    let flushed = services.cache.layer().store().flush_all().await;
    tracing::warn!("Cache flush requested by admin: {flushed}");

    Ok(Json(CacheFlushResponse { flushed }))
}
