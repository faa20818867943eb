//! Read-through caching for whole routes.
//!
//! Applied per route with `axum::middleware::from_fn_with_state`. GET
//! requests are looked up under a key derived from the route's path and
//! query parameters; successful JSON responses are stored on the way out.

use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    body::{Body, HttpBody},
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{
        Method, StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use redis_connection::{CacheKey, CacheLayer};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    policy::RouteCachePolicy,
    response::{X_CACHE, cache_header, mark_cached},
};

/// Larger bodies are passed through without being cached.
pub const MAX_CACHED_BODY: usize = 2 * 1024 * 1024;

/// Middleware state: the shared cache layer and one route's policy.
#[derive(Clone)]
pub struct RouteCache {
    layer: CacheLayer,
    policy: Arc<RouteCachePolicy>,
}

impl RouteCache {
    pub fn new(layer: CacheLayer, policy: RouteCachePolicy) -> Self {
        Self {
            layer,
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &RouteCachePolicy { &self.policy }
}

#[instrument(skip_all, fields(path = %request.uri().path(), cache.namespace = cache.policy.namespace))]
pub async fn read_through_layer(
    State(cache): State<RouteCache>, request: Request, next: Next,
) -> Response {
    if request.method() != Method::GET || !cache.layer.store().is_connected() {
        return next.run(request).await;
    }

    let (request, key) = request_key(&cache.policy, request).await;
    let Some(key) = key
    else {
        return next.run(request).await;
    };

    if let Some(envelope) = cache.layer.lookup::<Value>(&key).await {
        return hit_response(envelope.value, envelope.cached_at);
    }

    let response = next.run(request).await;
    capture(&cache, &key, response).await
}

async fn request_key(
    policy: &RouteCachePolicy, request: Request,
) -> (Request, Option<CacheKey>) {
    let (mut parts, body) = request.into_parts();

    let path = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();
    let key = match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        Ok(Query(pairs)) => policy.key_for(&path, pairs.into_iter().collect()),
        Err(err) => {
            debug!("Uncacheable query string: {err}");
            None
        }
    };

    (Request::from_parts(parts, body), key)
}

fn hit_response(value: Value, cached_at: DateTime<Utc>) -> Response {
    let mut response = Json(mark_cached(value, Some(cached_at))).into_response();
    response.headers_mut().insert(X_CACHE, cache_header(true));
    response
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn mark_miss(mut response: Response) -> Response {
    response.headers_mut().insert(X_CACHE, cache_header(false));
    response
}

async fn capture(cache: &RouteCache, key: &CacheKey, response: Response) -> Response {
    if response.status() != StatusCode::OK || !is_json(&response) {
        return mark_miss(response);
    }

    let (mut parts, body) = response.into_parts();
    if body
        .size_hint()
        .upper()
        .is_none_or(|len| len > MAX_CACHED_BODY as u64)
    {
        debug!(cache.key = %key, "Response too large to cache");
        return mark_miss(Response::from_parts(parts, body));
    }

    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(cache.key = %key, error = %err, "Failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let value = match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => value,
        Err(_) => return mark_miss(Response::from_parts(parts, Body::from(bytes))),
    };

    cache.layer.populate(key, &value, cache.policy.ttl).await;

    let body = serde_json::to_vec(&mark_cached(value, None))
        .map(Body::from)
        .unwrap_or_else(|_| Body::from(bytes));
    parts.headers.remove(CONTENT_LENGTH);
    mark_miss(Response::from_parts(parts, body))
}
