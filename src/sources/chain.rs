use std::{fmt, sync::Arc, time::Instant};

use serde::Serialize;

use super::{ApiSource, CatalogSource, SnapshotSource, SourceError};
use crate::{
    catalog::{Registry, SourceTag, assemble, fallback_models, normalize_all},
    config::RegistryConfig,
};

/// A stage that was attempted (or skipped) and did not produce the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: SourceTag,
    pub message: String,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage failed: {}", self.stage, self.message)
    }
}

/// Outcome of one chain execution.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub registry: Registry,
    /// Stages that failed before the one that produced `registry`, in order.
    pub failures: Vec<StageFailure>,
    pub duration_ms: u64,
}

impl FetchReport {
    pub fn source(&self) -> SourceTag {
        self.registry.source()
    }

    /// Human-readable description of why earlier stages were skipped.
    pub fn failure_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Ordered sources with the hardcoded list as the terminal stage.
///
/// Stages run strictly in sequence; each is attempted once per execution.
/// The hardcoded stage needs no parsing or I/O, so a chain execution always
/// yields a registry.
#[derive(Clone)]
pub struct FallbackChain {
    stages: Vec<Arc<dyn CatalogSource>>,
}

impl FallbackChain {
    /// API stage followed by the snapshot stage.
    pub fn new(api: ApiSource, snapshot: SnapshotSource) -> Self {
        Self::with_stages(vec![Arc::new(api), Arc::new(snapshot)])
    }

    pub fn with_stages(stages: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self { stages }
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self, SourceError> {
        Ok(Self::new(
            ApiSource::from_config(&config.upstream)?,
            SnapshotSource::from_config(&config.snapshot),
        ))
    }

    /// Labels of the configured stages, excluding the terminal fallback.
    pub fn stage_tags(&self) -> Vec<SourceTag> {
        self.stages.iter().map(|stage| stage.tag()).collect()
    }

    /// Run the chain and return the first registry produced.
    pub async fn fetch_with_fallback(&self) -> Registry {
        self.fetch_with_report().await.registry
    }

    /// Run the chain, also reporting which stages failed and why.
    pub async fn fetch_with_report(&self) -> FetchReport {
        let start = Instant::now();
        let mut failures = Vec::new();

        for stage in &self.stages {
            let tag = stage.tag();
            match stage.fetch_raw().await {
                Ok(raw) => {
                    let registry = assemble(normalize_all(&raw), tag);
                    let duration_ms = start.elapsed().as_millis() as u64;
                    tracing::info!(
                        source = %tag,
                        model_count = registry.len(),
                        provider_count = registry.metadata().provider_count,
                        duration_ms,
                        "Model registry loaded"
                    );
                    return FetchReport {
                        registry,
                        failures,
                        duration_ms,
                    };
                }
                Err(SourceError::Disabled) => {
                    tracing::debug!(source = %tag, "Catalog source disabled, skipping");
                    failures.push(StageFailure {
                        stage: tag,
                        message: SourceError::Disabled.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        source = %tag,
                        error = %e,
                        "Catalog source failed, falling back to next stage"
                    );
                    failures.push(StageFailure {
                        stage: tag,
                        message: e.to_string(),
                    });
                }
            }
        }

        let registry = assemble(fallback_models(), SourceTag::Fallback);
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::warn!(
            model_count = registry.len(),
            failed_stages = failures.len(),
            duration_ms,
            "All catalog sources failed, using hardcoded fallback models"
        );

        FetchReport {
            registry,
            failures,
            duration_ms,
        }
    }
}

impl fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("stages", &self.stage_tags())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::{test_support::StubSource, *};

    #[tokio::test]
    async fn test_api_success_tags_api() {
        let api = Arc::new(StubSource::ok(SourceTag::Api, vec!["openai/gpt-4o"]));
        let snapshot = Arc::new(StubSource::ok(SourceTag::Snapshot, vec!["a/b"]));
        let stages: Vec<Arc<dyn CatalogSource>> = vec![api.clone(), snapshot.clone()];
        let chain = FallbackChain::with_stages(stages);

        let report = chain.fetch_with_report().await;

        assert_eq!(report.source(), SourceTag::Api);
        assert!(report.failures.is_empty());
        assert!(report.failure_summary().is_none());
        assert!(report.registry.get("openai/gpt-4o").is_some());
        assert_eq!(api.calls(), 1);
        assert_eq!(snapshot.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_failure_falls_to_snapshot() {
        let chain = FallbackChain::with_stages(vec![
            Arc::new(StubSource::failing(SourceTag::Api, "boom")),
            Arc::new(StubSource::ok(SourceTag::Snapshot, vec!["a/b", "c/d"])),
        ]);

        let report = chain.fetch_with_report().await;

        assert_eq!(report.source(), SourceTag::Snapshot);
        assert_eq!(report.registry.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, SourceTag::Api);
        assert!(report.failures[0].message.contains("boom"));
    }

    #[tokio::test]
    async fn test_both_fail_uses_hardcoded() {
        let chain = FallbackChain::with_stages(vec![
            Arc::new(StubSource::failing(SourceTag::Api, "api down")),
            Arc::new(StubSource::failing(SourceTag::Snapshot, "snapshot corrupt")),
        ]);

        let registry = chain.fetch_with_fallback().await;
        assert_eq!(registry.source(), SourceTag::Fallback);
        assert!(!registry.is_empty());

        let report = chain.fetch_with_report().await;
        let summary = report.failure_summary().unwrap();
        assert!(summary.contains("api stage failed: Unexpected response shape: api down"));
        assert!(summary.contains("snapshot stage failed"));
    }

    #[tokio::test]
    async fn test_stages_run_in_order_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = FallbackChain::with_stages(vec![
            Arc::new(StubSource::failing(SourceTag::Api, "x").logged(log.clone())),
            Arc::new(StubSource::failing(SourceTag::Snapshot, "y").logged(log.clone())),
        ]);

        chain.fetch_with_fallback().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![SourceTag::Api, SourceTag::Snapshot]
        );
    }

    #[tokio::test]
    async fn test_disabled_api_stage_reported() {
        let config = RegistryConfig::from_str(
            r#"
            [upstream]
            enabled = false
        "#,
        )
        .unwrap();
        let chain = FallbackChain::from_config(&config).unwrap();
        assert_eq!(chain.stage_tags(), vec![SourceTag::Api, SourceTag::Snapshot]);

        let report = chain.fetch_with_report().await;
        assert_eq!(report.source(), SourceTag::Snapshot);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, SourceTag::Api);
    }

    #[tokio::test]
    async fn test_empty_chain_is_hardcoded() {
        let chain = FallbackChain::with_stages(Vec::new());
        let registry = chain.fetch_with_fallback().await;
        assert_eq!(registry.source(), SourceTag::Fallback);
        assert!(registry.len() >= 10);
    }
}
