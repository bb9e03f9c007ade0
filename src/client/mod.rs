//! Cached, observable access to the model registry.
//!
//! [`CatalogClient`] owns the fallback chain and an optional persistence
//! cache. It loads the registry on demand, coalesces overlapping loads into a
//! single chain execution, and publishes every state change on a
//! [`tokio::sync::watch`] channel for reactive consumers.
//!
//! ```rust,ignore
//! let client = CatalogClient::from_config(&config)?;
//! let mut updates = client.subscribe();
//!
//! client.ensure_loaded().await;
//! let limit = client.context_limit("anthropic/claude-3.5-sonnet");
//! ```

mod state;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
pub use state::CatalogState;
use tokio::sync::{Mutex, watch};

use crate::{
    cache::{Cache, CacheExt, CacheKeys, create_cache},
    catalog::{self, NormalizedModel, QueryOptions, Registry},
    config::RegistryConfig,
    sources::{FallbackChain, SourceError},
};

type PendingLoad = Shared<BoxFuture<'static, Arc<Registry>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    /// Use a valid cached registry when there is one.
    CacheFirst,
    /// Always run the fallback chain.
    Force,
}

/// Handle to a shared registry. Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    chain: FallbackChain,
    cache: Option<Arc<dyn Cache>>,
    cache_key: String,
    state: watch::Sender<CatalogState>,
    /// At most one chain execution at a time; late callers await this one.
    in_flight: Mutex<Option<PendingLoad>>,
}

impl CatalogClient {
    pub fn new(chain: FallbackChain, cache: Option<Arc<dyn Cache>>) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        Self {
            inner: Arc::new(ClientInner {
                chain,
                cache,
                cache_key: CacheKeys::registry(),
                state,
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self, SourceError> {
        Ok(Self::new(
            FallbackChain::from_config(config)?,
            create_cache(&config.cache),
        ))
    }

    /// Return the current registry, loading it first if there is none or it
    /// has expired. Consults the cache before running the fallback chain.
    pub async fn ensure_loaded(&self) -> Arc<Registry> {
        if let Some(registry) = self.fresh_registry() {
            return registry;
        }
        self.load(LoadMode::CacheFirst).await
    }

    /// Run the fallback chain now, bypassing the cache. Joins a load that is
    /// already in progress instead of starting a second one.
    pub async fn refresh(&self) -> Arc<Registry> {
        self.load(LoadMode::Force).await
    }

    /// Refresh when nothing is loaded, the registry has expired, or it came
    /// from a degraded source (snapshot or hardcoded data).
    /// Returns the new registry when a load happened.
    pub async fn refresh_if_stale(&self) -> Option<Arc<Registry>> {
        if self
            .fresh_registry()
            .is_some_and(|registry| !registry.source().is_degraded())
        {
            return None;
        }
        let mode = if self.registry().is_some() {
            LoadMode::Force
        } else {
            LoadMode::CacheFirst
        };
        Some(self.load(mode).await)
    }

    /// Publish an externally obtained registry without running the chain.
    pub fn hydrate(&self, registry: Registry) {
        let registry = Arc::new(registry);
        self.inner.state.send_modify(|state| {
            state.last_updated = Some(registry.metadata().fetched_at);
            state.registry = Some(registry);
            state.error = None;
        });
    }

    /// Receive every state change (loading flag, registry, error).
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.inner.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> CatalogState {
        self.inner.state.borrow().clone()
    }

    pub fn registry(&self) -> Option<Arc<Registry>> {
        self.inner.state.borrow().registry.clone()
    }

    /// Current model list; empty before the first load.
    pub fn models(&self) -> Vec<NormalizedModel> {
        self.inner.state.borrow().models().to_vec()
    }

    pub fn get_model(&self, id: &str) -> Option<NormalizedModel> {
        self.registry()?.get(id).cloned()
    }

    /// Resolve a loose model reference (slug, display name, fuzzy spelling).
    pub fn find_model(&self, query: &str) -> Option<NormalizedModel> {
        let registry = self.registry()?;
        catalog::find_model(query, registry.models()).cloned()
    }

    pub fn context_limit(&self, id: &str) -> Option<u64> {
        self.registry()?.context_limit(id)
    }

    pub fn query(&self, options: &QueryOptions) -> Vec<NormalizedModel> {
        match self.registry() {
            Some(registry) => catalog::query(registry.models(), options),
            None => Vec::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn is_stale(&self) -> bool {
        self.inner.state.borrow().is_stale()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.state.borrow().last_updated
    }

    fn fresh_registry(&self) -> Option<Arc<Registry>> {
        let state = self.inner.state.borrow();
        match &state.registry {
            Some(registry) if !registry.is_expired() => Some(registry.clone()),
            _ => None,
        }
    }

    async fn load(&self, mode: LoadMode) -> Arc<Registry> {
        let pending = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.as_ref() {
                Some(pending) => {
                    tracing::debug!("Joining in-flight registry load");
                    pending.clone()
                }
                None => {
                    let inner = self.inner.clone();
                    let pending = async move { inner.run_load(mode).await }
                        .boxed()
                        .shared();
                    *in_flight = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }
}

impl ClientInner {
    async fn run_load(self: Arc<Self>, mode: LoadMode) -> Arc<Registry> {
        self.state.send_modify(|state| state.loading = true);

        let cached = match mode {
            LoadMode::CacheFirst => self.read_cache().await,
            LoadMode::Force => None,
        };

        let (registry, error) = match cached {
            Some(registry) => (Arc::new(registry), None),
            None => {
                let report = self.chain.fetch_with_report().await;
                let error = report.failure_summary();
                let registry = Arc::new(report.registry);
                self.write_cache(&registry).await;
                (registry, error)
            }
        };

        self.state.send_modify(|state| {
            state.last_updated = Some(registry.metadata().fetched_at);
            state.registry = Some(registry.clone());
            state.error = error;
            state.loading = false;
        });

        self.in_flight.lock().await.take();
        registry
    }

    /// Best-effort read. Expired, degraded, unreadable or missing entries all miss.
    async fn read_cache(&self) -> Option<Registry> {
        let cache = self.cache.as_ref()?;
        match cache.get_json::<Registry>(&self.cache_key).await {
            Ok(Some(registry)) if registry.source().is_degraded() => {
                tracing::debug!(
                    source = %registry.source(),
                    "Ignoring cached model registry from degraded source"
                );
                None
            }
            Ok(Some(registry)) if !registry.is_expired() => {
                tracing::info!(
                    source = %registry.source(),
                    model_count = registry.len(),
                    fetched_at = %registry.metadata().fetched_at,
                    "Loaded model registry from cache"
                );
                Some(registry)
            }
            Ok(Some(_)) => {
                tracing::debug!("Cached model registry has expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cached model registry");
                None
            }
        }
    }

    /// Best-effort write of API registries. Failures are logged and otherwise
    /// ignored. Degraded registries are never persisted, so the next process
    /// retries the API instead of inheriting an outage.
    async fn write_cache(&self, registry: &Registry) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };

        if registry.source().is_degraded() {
            tracing::debug!(
                source = %registry.source(),
                "Not caching model registry from degraded source"
            );
            return;
        }

        let ttl = registry.remaining_ttl_at(Utc::now());
        if ttl.is_zero() {
            return;
        }

        match cache.set_json(&self.cache_key, registry, ttl).await {
            Ok(()) => tracing::debug!(
                model_count = registry.len(),
                ttl_secs = ttl.as_secs(),
                "Cached model registry"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to cache model registry"),
        }
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("CatalogClient")
            .field("chain", &self.inner.chain)
            .field("cached", &self.inner.cache.is_some())
            .field("models", &state.models().len())
            .field("loading", &state.loading)
            .finish()
    }
}
