//! Immutable, fully indexed registry snapshots.
//!
//! A [`Registry`] is built in one step by [`assemble`] from a finished model
//! list and never mutated afterwards. Refreshing the catalog produces a new
//! registry; readers holding an older snapshot keep a consistent view.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::model::{NormalizedModel, Provider, SizeTier};

/// Version of the persisted registry layout.
pub const REGISTRY_SCHEMA_VERSION: u32 = 1;

/// Fixed lifetime of a registry snapshot.
pub const REGISTRY_TTL: Duration = Duration::hours(24);

/// Which stage of the fallback chain produced a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    /// Live upstream API
    Api,
    /// Snapshot bundled with the build
    Snapshot,
    /// Hardcoded model list
    Fallback,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Api => "api",
            SourceTag::Snapshot => "snapshot",
            SourceTag::Fallback => "fallback",
        }
    }

    /// Whether data from this source may be out of date.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, SourceTag::Api)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub schema_version: u32,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub model_count: usize,
    pub provider_count: usize,
    pub source: SourceTag,
}

/// Aggregate statistics over a set of models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_models: usize,
    pub provider_count: usize,
    pub average_context: f64,
    pub min_context: u64,
    pub max_context: u64,
    pub free_models: usize,
    pub image_capable_models: usize,
}

/// An immutable registry snapshot with lookup indices.
///
/// Indices hold positions into the sorted model list, so each model is owned
/// exactly once by the registry that contains it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "PersistedRegistry", from = "PersistedRegistry")]
pub struct Registry {
    metadata: RegistryMetadata,
    models: Vec<NormalizedModel>,
    by_id: HashMap<String, usize>,
    /// Provider buckets in first-seen order
    by_provider: Vec<(String, Vec<usize>)>,
    provider_positions: HashMap<String, usize>,
    /// Always holds all five tiers
    by_tier: BTreeMap<SizeTier, Vec<usize>>,
}

/// Serialized form of a registry. Indices are rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedRegistry {
    pub metadata: RegistryMetadata,
    pub models: Vec<NormalizedModel>,
}

/// Assemble a registry stamped with the current time.
pub fn assemble(models: Vec<NormalizedModel>, source: SourceTag) -> Registry {
    assemble_at(models, source, Utc::now())
}

/// Assemble a registry with an explicit fetch time.
///
/// Models are ordered by descending context length. The sort is stable, so
/// models with equal context keep their input order.
pub fn assemble_at(
    mut models: Vec<NormalizedModel>,
    source: SourceTag,
    fetched_at: DateTime<Utc>,
) -> Registry {
    models.sort_by(|a, b| b.context_length.cmp(&a.context_length));

    let indices = Indices::build(&models);
    let metadata = RegistryMetadata {
        schema_version: REGISTRY_SCHEMA_VERSION,
        fetched_at,
        expires_at: fetched_at + REGISTRY_TTL,
        model_count: models.len(),
        provider_count: indices.by_provider.len(),
        source,
    };

    Registry::from_parts(metadata, models, indices)
}

struct Indices {
    by_id: HashMap<String, usize>,
    by_provider: Vec<(String, Vec<usize>)>,
    provider_positions: HashMap<String, usize>,
    by_tier: BTreeMap<SizeTier, Vec<usize>>,
}

impl Indices {
    fn build(models: &[NormalizedModel]) -> Self {
        let mut by_id = HashMap::with_capacity(models.len());
        let mut by_provider: Vec<(String, Vec<usize>)> = Vec::new();
        let mut provider_positions = HashMap::new();
        let mut by_tier: BTreeMap<SizeTier, Vec<usize>> =
            SizeTier::ALL.into_iter().map(|t| (t, Vec::new())).collect();

        for (idx, model) in models.iter().enumerate() {
            if let Some(previous) = by_id.insert(model.id.clone(), idx) {
                // Last write wins; flag it since upstream ids should be unique.
                tracing::warn!(
                    model_id = %model.id,
                    previous_position = previous,
                    position = idx,
                    "Duplicate model identifier in registry input"
                );
            }

            let bucket = *provider_positions
                .entry(model.provider.id.clone())
                .or_insert_with(|| {
                    by_provider.push((model.provider.id.clone(), Vec::new()));
                    by_provider.len() - 1
                });
            by_provider[bucket].1.push(idx);

            by_tier.entry(model.size_tier).or_default().push(idx);
        }

        Self {
            by_id,
            by_provider,
            provider_positions,
            by_tier,
        }
    }
}

impl Registry {
    fn from_parts(metadata: RegistryMetadata, models: Vec<NormalizedModel>, indices: Indices) -> Self {
        Self {
            metadata,
            models,
            by_id: indices.by_id,
            by_provider: indices.by_provider,
            provider_positions: indices.provider_positions,
            by_tier: indices.by_tier,
        }
    }

    pub fn metadata(&self) -> &RegistryMetadata {
        &self.metadata
    }

    pub fn source(&self) -> SourceTag {
        self.metadata.source
    }

    /// All models, largest context first.
    pub fn models(&self) -> &[NormalizedModel] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Look up a model by its exact identifier.
    pub fn get(&self, id: &str) -> Option<&NormalizedModel> {
        self.by_id.get(id).map(|&idx| &self.models[idx])
    }

    /// Context window of a model, if the identifier is known.
    pub fn context_limit(&self, id: &str) -> Option<u64> {
        self.get(id).map(|m| m.context_length)
    }

    /// Models from one provider, in registry order.
    pub fn by_provider(&self, provider_id: &str) -> Vec<&NormalizedModel> {
        self.provider_positions
            .get(provider_id)
            .map(|&bucket| self.resolve(&self.by_provider[bucket].1))
            .unwrap_or_default()
    }

    /// Models in one size tier, in registry order.
    pub fn by_tier(&self, tier: SizeTier) -> Vec<&NormalizedModel> {
        self.by_tier
            .get(&tier)
            .map(|positions| self.resolve(positions))
            .unwrap_or_default()
    }

    /// Number of models in each tier; every tier is present.
    pub fn tier_counts(&self) -> BTreeMap<SizeTier, usize> {
        self.by_tier
            .iter()
            .map(|(tier, positions)| (*tier, positions.len()))
            .collect()
    }

    /// Provider identifiers in first-seen order.
    pub fn provider_ids(&self) -> impl Iterator<Item = &str> {
        self.by_provider.iter().map(|(id, _)| id.as_str())
    }

    /// Distinct providers in first-seen order.
    pub fn providers(&self) -> Vec<Provider> {
        self.by_provider
            .iter()
            .filter_map(|(_, positions)| positions.first())
            .map(|&idx| self.models[idx].provider.clone())
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = stats_for(&self.models);
        stats.provider_count = self.by_provider.len();
        stats
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.metadata.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining_ttl_at(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.metadata.expires_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }

    fn resolve(&self, positions: &[usize]) -> Vec<&NormalizedModel> {
        positions.iter().map(|&idx| &self.models[idx]).collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("source", &self.metadata.source)
            .field("model_count", &self.metadata.model_count)
            .field("provider_count", &self.metadata.provider_count)
            .field("expires_at", &self.metadata.expires_at)
            .finish()
    }
}

impl From<Registry> for PersistedRegistry {
    fn from(registry: Registry) -> Self {
        Self {
            metadata: registry.metadata,
            models: registry.models,
        }
    }
}

impl From<PersistedRegistry> for Registry {
    /// Rebuild indices without re-sorting or re-stamping the metadata.
    fn from(persisted: PersistedRegistry) -> Self {
        let indices = Indices::build(&persisted.models);
        Registry::from_parts(persisted.metadata, persisted.models, indices)
    }
}

/// Aggregate statistics over an arbitrary model slice.
pub fn stats_for(models: &[NormalizedModel]) -> RegistryStats {
    if models.is_empty() {
        return RegistryStats::default();
    }

    let total_context: u128 = models.iter().map(|m| m.context_length as u128).sum();
    let mut providers: Vec<&str> = models.iter().map(|m| m.provider.id.as_str()).collect();
    providers.sort_unstable();
    providers.dedup();

    RegistryStats {
        total_models: models.len(),
        provider_count: providers.len(),
        average_context: total_context as f64 / models.len() as f64,
        min_context: models.iter().map(|m| m.context_length).min().unwrap_or(0),
        max_context: models.iter().map(|m| m.context_length).max().unwrap_or(0),
        free_models: models.iter().filter(|m| m.pricing.is_free).count(),
        image_capable_models: models.iter().filter(|m| m.supports_images()).count(),
    }
}
