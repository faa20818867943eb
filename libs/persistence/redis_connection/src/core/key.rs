use std::{collections::BTreeMap, fmt};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::CacheError;

/// Separator between key segments. Namespaces never contain it, so
/// `"<namespace>:"` selects exactly one resource family.
pub const SEGMENT_SEPARATOR: char = ':';

/// A derived cache key: `<namespace>:<identity>[:<segment>...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    raw: String,
    namespace_len: usize,
}

impl CacheKey {
    /// Key for a single resource fetched by id, e.g. `video:v1`.
    pub fn resource(namespace: &str, id: impl fmt::Display) -> Self {
        Self::root(namespace).with_segment(id)
    }

    /// Key for a parameterised view, e.g. `trending:{"page":"1"}`.
    ///
    /// Parameters are serialised in sorted key order so equivalent query
    /// strings map to the same key.
    pub fn params(namespace: &str, params: &CacheParams) -> Self {
        Self::root(namespace).with_segment(params.canonical())
    }

    /// The bare namespace, to be extended with [`CacheKey::with_segment`].
    pub fn root(namespace: &str) -> Self {
        debug_assert!(
            !namespace.is_empty() && !namespace.contains(SEGMENT_SEPARATOR),
            "invalid cache namespace {namespace:?}"
        );
        Self {
            raw: namespace.to_owned(),
            namespace_len: namespace.len(),
        }
    }

    pub fn with_segment(mut self, segment: impl fmt::Display) -> Self {
        use fmt::Write;

        self.raw.push(SEGMENT_SEPARATOR);
        // writing into a String cannot fail
        let _ = write!(self.raw, "{segment}");
        self
    }

    pub fn namespace(&self) -> &str { &self.raw[..self.namespace_len] }

    pub fn as_str(&self) -> &str { &self.raw }

    /// Prefix shared by every key in `namespace`.
    pub fn namespace_prefix(namespace: &str) -> String {
        format!("{namespace}{SEGMENT_SEPARATOR}")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str { &self.raw }
}

/// Request parameters in canonical (sorted, empty-free) form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheParams(BTreeMap<String, String>);

impl CacheParams {
    pub fn new() -> Self { Self::default() }

    /// Adds a parameter. Empty values are dropped: `?category=` and an
    /// absent `category` describe the same request.
    pub fn insert(
        &mut self, name: impl Into<String>, value: impl Into<String>,
    ) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(name.into(), value);
        }
    }

    pub fn with(
        mut self, name: impl Into<String>, value: impl Into<String>,
    ) -> Self {
        self.insert(name, value);
        self
    }

    /// Flattens a serialisable query struct into parameters. `None` fields
    /// are skipped, strings are taken verbatim and other scalars use their
    /// JSON text.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, CacheError> {
        let value = serde_json::to_value(value)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        match value {
            Value::Object(map) => {
                let mut params = Self::new();
                for (name, value) in map {
                    match value {
                        Value::Null => {}
                        Value::String(text) => params.insert(name, text),
                        other => params.insert(name, other.to_string()),
                    }
                }
                Ok(params)
            }
            Value::Null => Ok(Self::new()),
            other => {
                Err(CacheError::Serialization(format!(
                    "expected a parameter map, got {other}"
                )))
            }
        }
    }

    pub fn extend(&mut self, other: CacheParams) {
        self.0.extend(other.0);
    }

    /// Keeps only the parameters whose name passes `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|name, _| keep(name));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    /// JSON object text with keys in sorted order; `{}` when empty.
    pub fn canonical(&self) -> String {
        let object: serde_json::Map<String, Value> = self
            .0
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        Value::Object(object).to_string()
    }
}

impl<K, V> FromIterator<(K, V)> for CacheParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// A key family bound to the type of value cached under it. Implemented by
/// [`crate::cache_key!`].
pub trait TypedCacheKey {
    type Value: Serialize + DeserializeOwned + Send + Sync;
    type Args<'r>;

    const NAMESPACE: &'static str;

    fn key_with_args(&self, args: Self::Args<'_>) -> CacheKey;

    fn sweep_prefix(&self) -> String {
        CacheKey::namespace_prefix(Self::NAMESPACE)
    }
}

/// Escapes Redis glob metacharacters so a prefix is matched literally.
pub fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\' | '^') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[test]
    fn resource_key_layout() {
        let key = CacheKey::resource("video", "v1");

        assert_eq!(key.as_str(), "video:v1");
        assert_eq!(key.namespace(), "video");
    }

    #[test]
    fn empty_params_serialise_to_empty_object() {
        let key = CacheKey::params("trending", &CacheParams::new());

        assert_eq!(key.as_str(), "trending:{}");
    }

    #[test]
    fn parameter_order_does_not_change_the_key() {
        let forward: CacheParams =
            [("page", "2"), ("category", "music"), ("limit", "20")]
                .into_iter()
                .collect();
        let backward: CacheParams =
            [("limit", "20"), ("category", "music"), ("page", "2")]
                .into_iter()
                .collect();

        assert_eq!(
            CacheKey::params("videos-list", &forward),
            CacheKey::params("videos-list", &backward)
        );
        assert_eq!(
            forward.canonical(),
            r#"{"category":"music","limit":"20","page":"2"}"#
        );
    }

    #[test]
    fn different_params_give_different_keys() {
        let page_one = CacheParams::new().with("page", "1");
        let page_two = CacheParams::new().with("page", "2");

        assert_ne!(
            CacheKey::params("search", &page_one),
            CacheKey::params("search", &page_two)
        );
    }

    #[test]
    fn empty_values_are_dropped() {
        let params = CacheParams::new().with("category", "").with("page", "1");

        assert_eq!(params.canonical(), r#"{"page":"1"}"#);
    }

    #[test]
    fn from_serialize_flattens_scalars() {
        #[derive(Serialize)]
        struct Query {
            page: u32,
            category: Option<String>,
            search: Option<String>,
            approved: bool,
        }

        let params = CacheParams::from_serialize(&Query {
            page: 3,
            category: Some("gaming".into()),
            search: None,
            approved: true,
        })
        .unwrap();

        assert_eq!(
            params.canonical(),
            r#"{"approved":"true","category":"gaming","page":"3"}"#
        );
    }

    #[test]
    fn segments_extend_the_key() {
        let key = CacheKey::resource("recommendations", "u1").with_segment(10);

        assert_eq!(key.as_str(), "recommendations:u1:10");
        assert_eq!(key.namespace(), "recommendations");
    }

    #[test]
    fn glob_characters_are_escaped() {
        assert_eq!(escape_glob("videos-list:"), "videos-list:");
        assert_eq!(escape_glob("a*b?[c]"), r"a\*b\?\[c\]");
    }
}
