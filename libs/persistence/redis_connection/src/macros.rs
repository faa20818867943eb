/// Declares a typed cache key family.
///
/// ```ignore
/// // video:<id>
/// cache_key!(VideoCacheKey::<VideoResponse> => "video"[id: String]);
/// // trending:<canonical params>
/// cache_key!(TrendingCacheKey::<Vec<VideoResponse>> => "trending"{params});
/// ```
#[macro_export]
macro_rules! cache_key {
    ($name:ident::<$t:ty> => $namespace:literal[$($arg:ident: $ty:ty),+]) => {
        #[doc=concat!("Cache key family\n ## Key \n", $namespace $(, ":{", stringify!($arg), "}")+)]
        #[doc=concat!("\n ## Value Type \n ", stringify!($t))]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::core::TypedCacheKey for $name {
            type Value = $t;
            type Args<'r> = ($(&'r $ty,)+);

            const NAMESPACE: &'static str = $namespace;

            fn key_with_args(&self, args: Self::Args<'_>) -> $crate::core::CacheKey {
                let ($($arg,)+) = args;

                $crate::core::CacheKey::root($namespace)$(.with_segment($arg))+
            }
        }
    };
    ($name:ident::<$t:ty> => $namespace:literal{params}) => {
        #[doc=concat!("Cache key family\n ## Key \n", $namespace, ":{params}")]
        #[doc=concat!("\n ## Value Type \n ", stringify!($t))]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::core::TypedCacheKey for $name {
            type Value = $t;
            type Args<'r> = &'r $crate::core::CacheParams;

            const NAMESPACE: &'static str = $namespace;

            fn key_with_args(&self, params: Self::Args<'_>) -> $crate::core::CacheKey {
                $crate::core::CacheKey::params($namespace, params)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{CacheParams, TypedCacheKey};

    cache_key!(ClipKey::<String> => "clip"[id: String]);
    cache_key!(ClipPageKey::<Vec<String>> => "clip-page"[owner: String, page: u32]);
    cache_key!(ClipSearchKey::<Vec<String>> => "clip-search"{params});

    #[test]
    fn segment_keys() {
        let id = "c1".to_string();
        let owner = "u9".to_string();

        assert_eq!(ClipKey.key_with_args((&id,)).as_str(), "clip:c1");
        assert_eq!(
            ClipPageKey.key_with_args((&owner, &3)).as_str(),
            "clip-page:u9:3"
        );
        assert_eq!(ClipKey.sweep_prefix(), "clip:");
    }

    #[test]
    fn params_keys() {
        let params = CacheParams::new().with("q", "cats").with("sort", "views");

        let key = ClipSearchKey.key_with_args(&params);

        assert_eq!(key.as_str(), r#"clip-search:{"q":"cats","sort":"views"}"#);
        assert_eq!(key.namespace(), ClipSearchKey::NAMESPACE);
    }
}
