pub mod middleware;
pub mod policy;
pub mod response;

pub use middleware::{MAX_CACHED_BODY, RouteCache, read_through_layer};
pub use policy::{KeyShape, RouteCachePolicy};
pub use response::{CachedJson, X_CACHE, mark_cached};
