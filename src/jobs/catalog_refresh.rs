//! Catalog refresh worker.
//!
//! Wakes on a fixed interval and reloads the registry when it has expired or
//! came from a degraded source. The load path cannot fail, so the worker never
//! exits on its own; degraded loads (snapshot or hardcoded data) are logged as
//! warnings and the API is retried on every following pass until it answers.

use std::time::{Duration, Instant};

use crate::{catalog::SourceTag, client::CatalogClient, config::RefreshConfig};

/// Results from a single refresh pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRunResult {
    /// Whether the registry was reloaded on this pass.
    pub refreshed: bool,
    /// Number of models in the current registry.
    pub model_count: usize,
    /// Source of the current registry.
    pub source: Option<SourceTag>,
    /// Duration of the pass in milliseconds.
    pub duration_ms: u64,
}

/// Starts the catalog refresh worker.
///
/// Runs an initial pass immediately, then one pass per interval, until the
/// task is cancelled.
pub async fn start_catalog_refresh_worker(client: CatalogClient, config: RefreshConfig) {
    if !config.enabled {
        tracing::info!("Catalog refresh worker disabled by configuration");
        return;
    }

    tracing::info!(
        interval_secs = config.interval_secs,
        "Starting catalog refresh worker"
    );

    let interval = Duration::from_secs(config.interval_secs.max(1));

    let result = run_refresh(&client).await;
    log_result(&client, &result, true);

    loop {
        tokio::time::sleep(interval).await;

        let result = run_refresh(&client).await;
        log_result(&client, &result, false);
    }
}

/// Run a single refresh pass.
pub async fn run_refresh(client: &CatalogClient) -> RefreshRunResult {
    let start = Instant::now();
    let refreshed = client.refresh_if_stale().await.is_some();
    let state = client.state();

    RefreshRunResult {
        refreshed,
        model_count: state.models().len(),
        source: state.source(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

fn log_result(client: &CatalogClient, result: &RefreshRunResult, initial: bool) {
    if !result.refreshed {
        tracing::debug!(
            model_count = result.model_count,
            "Model registry still fresh, skipping refresh"
        );
        return;
    }

    let source = result.source.map(|s| s.as_str()).unwrap_or("none");
    if result.source.is_some_and(|s| s.is_degraded()) {
        let error = client.last_error().unwrap_or_default();
        tracing::warn!(
            source,
            model_count = result.model_count,
            duration_ms = result.duration_ms,
            error = %error,
            "Model registry refreshed from degraded source"
        );
    } else if initial {
        tracing::info!(
            source,
            model_count = result.model_count,
            duration_ms = result.duration_ms,
            "Initial model registry load complete"
        );
    } else {
        tracing::debug!(
            source,
            model_count = result.model_count,
            duration_ms = result.duration_ms,
            "Model registry refresh complete"
        );
    }
}
