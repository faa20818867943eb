use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::CacheError;

/// What actually gets stored: the payload plus the moment it was cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope<T> {
    pub cached_at: DateTime<Utc>,
    pub value: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(value: T) -> Self {
        Self {
            cached_at: Utc::now(),
            value,
        }
    }
}

impl<T: Serialize> CacheEnvelope<T> {
    pub fn encode(&self) -> Result<Bytes, CacheError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

impl<T: DeserializeOwned> CacheEnvelope<T> {
    pub fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        serde_json::from_slice(bytes)
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn envelope_layout_is_camel_case() {
        let envelope = CacheEnvelope::new(vec![1, 2, 3]);
        let bytes = envelope.encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert!(json.get("cachedAt").is_some());
        assert_eq!(json["value"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn decode_rejects_foreign_payloads() {
        let err = CacheEnvelope::<Vec<u8>>::decode(b"\"not an envelope\"")
            .unwrap_err();

        assert!(matches!(err, CacheError::Deserialization(_)));
    }

    #[test]
    fn non_string_map_keys_fail_to_encode() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], "value");

        let err = CacheEnvelope::new(map).encode().unwrap_err();

        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
