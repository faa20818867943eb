pub mod backend;
pub mod key;
pub mod value;

pub use backend::CacheBackend;
pub use key::{CacheKey, CacheParams, TypedCacheKey};
pub use value::CacheEnvelope;
