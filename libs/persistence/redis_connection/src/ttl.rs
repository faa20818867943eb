use std::{collections::BTreeMap, time::Duration};

/// Resource kind to expiry table. Built once at startup, read-only after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    entries: BTreeMap<&'static str, Duration>,
    fallback: Duration,
}

impl TtlPolicy {
    /// Empty table; kinds without an entry expire after `fallback`.
    pub fn new(fallback: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, kind: &'static str, ttl: Duration) -> Self {
        self.entries.insert(kind, ttl);
        self
    }

    pub fn ttl_for(&self, kind: &str) -> Duration {
        self.entries.get(kind).copied().unwrap_or(self.fallback)
    }

    /// `override_ttl` when given, otherwise the table entry for `kind`.
    pub fn resolve(&self, kind: &str, override_ttl: Option<Duration>) -> Duration {
        override_ttl.unwrap_or_else(|| self.ttl_for(kind))
    }
}
