use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::catalog::{NormalizedModel, Registry, SourceTag};

/// Observable client state, published on every change.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    /// Current registry; `None` before the first load completes.
    pub registry: Option<Arc<Registry>>,

    /// A load or refresh is in progress.
    pub loading: bool,

    /// Why earlier fallback stages were skipped on the last load.
    /// Set alongside a (possibly degraded) registry, never instead of one.
    pub error: Option<String>,

    /// Fetch time of the current registry.
    pub last_updated: Option<DateTime<Utc>>,
}

impl CatalogState {
    pub fn models(&self) -> &[NormalizedModel] {
        self.registry
            .as_deref()
            .map(Registry::models)
            .unwrap_or_default()
    }

    pub fn source(&self) -> Option<SourceTag> {
        self.registry.as_deref().map(Registry::source)
    }

    /// True when a registry is loaded and its expiry has passed at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.registry
            .as_deref()
            .is_some_and(|registry| registry.is_expired_at(now))
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }
}
