use std::{collections::HashMap, time::Duration};

use redis_connection::{CacheKey, CacheParams};

/// How a route's request maps onto a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    /// `<namespace>:<value of the named path parameter>`
    Identity(&'static str),
    /// `<namespace>:<canonical path and query parameters>`
    Params,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCachePolicy {
    pub namespace: &'static str,
    pub shape: KeyShape,
    pub ttl: Duration,
    /// Query parameters that feed the key; `None` takes all of them.
    pub query_fields: Option<&'static [&'static str]>,
}

impl RouteCachePolicy {
    pub fn identity(namespace: &'static str, param: &'static str, ttl: Duration) -> Self {
        Self {
            namespace,
            shape: KeyShape::Identity(param),
            ttl,
            query_fields: None,
        }
    }

    pub fn params(namespace: &'static str, ttl: Duration) -> Self {
        Self {
            namespace,
            shape: KeyShape::Params,
            ttl,
            query_fields: None,
        }
    }

    /// Restricts the key to the query parameters the handler reads, so
    /// unrelated parameters cannot fan out into separate entries.
    pub fn with_query_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.query_fields = Some(fields);
        self
    }

    /// `None` when the request does not carry what the shape needs; such
    /// requests bypass the cache.
    pub fn key_for(
        &self, path: &HashMap<String, String>, query: CacheParams,
    ) -> Option<CacheKey> {
        match self.shape {
            KeyShape::Identity(param) => {
                path.get(param)
                    .filter(|id| !id.is_empty())
                    .map(|id| CacheKey::resource(self.namespace, id))
            }
            KeyShape::Params => {
                let mut params = query;
                if let Some(fields) = self.query_fields {
                    params.retain(|name| fields.contains(&name));
                }
                // path segments win over a query parameter of the same name
                params.extend(path.iter().collect());
                Some(CacheKey::params(self.namespace, &params))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn identity_uses_the_path_parameter() {
        let policy = RouteCachePolicy::identity("video", "id", Duration::from_secs(1));

        let key = policy.key_for(&path(&[("id", "v1")]), CacheParams::new());

        assert_eq!(key.unwrap().as_str(), "video:v1");
        assert_eq!(policy.key_for(&path(&[]), CacheParams::new()), None);
    }

    #[test]
    fn params_merge_path_and_query() {
        let policy = RouteCachePolicy::params("search", Duration::from_secs(1));
        let query = CacheParams::new().with("page", "2").with("query", "ignored");

        let key = policy
            .key_for(&path(&[("query", "music")]), query)
            .unwrap();

        assert_eq!(key.as_str(), r#"search:{"page":"2","query":"music"}"#);
    }

    #[test]
    fn undeclared_query_parameters_are_ignored() {
        let policy = RouteCachePolicy::params("trending", Duration::from_secs(1))
            .with_query_fields(&["page", "limit"]);
        let noisy = CacheParams::new().with("page", "2").with("x", "8f3a");
        let plain = CacheParams::new().with("page", "2");

        let noisy_key = policy.key_for(&path(&[]), noisy).unwrap();
        let plain_key = policy.key_for(&path(&[]), plain).unwrap();

        assert_eq!(noisy_key, plain_key);
        assert_eq!(noisy_key.as_str(), r#"trending:{"page":"2"}"#);
    }
}
