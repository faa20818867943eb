use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::HeaderName},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use redis_connection::Cached;
use serde::Serialize;
use serde_json::Value;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

pub(crate) fn cache_header(hit: bool) -> HeaderValue {
    HeaderValue::from_static(if hit { "HIT" } else { "MISS" })
}

/// Adds `cached` (and `cacheTimestamp` on a hit) to a JSON object. Other
/// JSON values are returned untouched.
pub fn mark_cached(mut value: Value, cached_at: Option<DateTime<Utc>>) -> Value {
    if let Value::Object(map) = &mut value {
        map.insert("cached".into(), Value::Bool(cached_at.is_some()));
        if let Some(at) = cached_at {
            map.insert(
                "cacheTimestamp".into(),
                Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
    }
    value
}

/// JSON response for a value that went through `cacheRead`, marked the
/// same way the route middleware marks its bodies.
#[derive(Debug)]
pub struct CachedJson<T>(pub Cached<T>);

impl<T: Serialize> IntoResponse for CachedJson<T> {
    fn into_response(self) -> Response {
        let cached = self.0;
        let cached_at = cached.cache_timestamp();

        match serde_json::to_value(&cached.value) {
            Ok(value) => {
                let mut response = Json(mark_cached(value, cached_at)).into_response();
                response
                    .headers_mut()
                    .insert(X_CACHE, cache_header(cached.is_hit()));
                response
            }
            Err(err) => {
                tracing::error!("Failed to serialize response: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use redis_connection::CacheEnvelope;
    use serde_json::json;

    use super::*;

    #[test]
    fn marks_objects_only() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let object = mark_cached(json!({"id": "v1"}), Some(at));
        let list = mark_cached(json!([1, 2]), Some(at));

        assert_eq!(object["cached"], true);
        assert_eq!(object["cacheTimestamp"], "2024-05-01T12:00:00.000Z");
        assert_eq!(list, json!([1, 2]));
    }

    #[tokio::test]
    async fn cached_json_sets_header_and_marker() {
        let hit = Cached::hit(CacheEnvelope::new(json!({"id": "v1"})));

        let response = CachedJson(hit).into_response();

        assert_eq!(response.headers()[X_CACHE], "HIT");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["cached"], true);
        assert!(body["cacheTimestamp"].is_string());
    }

    #[tokio::test]
    async fn miss_is_marked_uncached() {
        let response = CachedJson(Cached::miss(json!({"id": "v1"}))).into_response();

        assert_eq!(response.headers()[X_CACHE], "MISS");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["cached"], false);
        assert!(body.get("cacheTimestamp").is_none());
    }
}
