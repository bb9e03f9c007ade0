//! Model catalog: schema normalization, registry assembly and querying.
//!
//! Upstream records ([`RawModel`]) are normalized into [`NormalizedModel`]s,
//! assembled into an indexed [`Registry`], and queried with [`query`] and
//! [`find_model`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use llm_registry::catalog::{assemble, normalize_all, query, QueryOptions, SourceTag};
//!
//! let models = normalize_all(&raw_models);
//! let registry = assemble(models, SourceTag::Api);
//!
//! let large = query(registry.models(), &QueryOptions::new().min_context(100_000));
//! ```

mod fallback;
mod model;
mod normalize;
mod providers;
mod query;
mod registry;
mod types;

pub use fallback::fallback_models;
pub use model::{
    DefaultParameters, LegacyModality, Modality, ModelCapabilities, ModelPricing,
    NormalizedModel, PerRequestLimits, Provider, SizeTier, SupportedParameter,
};
pub use normalize::{
    DEFAULT_MAX_COMPLETION_TOKENS, normalize, normalize_all, normalize_at, split_identifier,
};
pub use providers::{
    UNKNOWN_PROVIDER_COLOR, UNKNOWN_PROVIDER_ICON, UNKNOWN_PROVIDER_ID, is_known_provider,
    lookup_provider,
};
pub use query::{OneOrMany, QueryOptions, SortKey, SortOrder, find_model, query};
pub use registry::{
    REGISTRY_SCHEMA_VERSION, REGISTRY_TTL, Registry, RegistryMetadata, RegistryStats, SourceTag,
    assemble, assemble_at, stats_for,
};
pub use types::{
    RawArchitecture, RawDefaultParameters, RawModel, RawModelList, RawPerRequestLimits,
    RawPricing, RawTopProvider,
};

/// Bundled snapshot of the upstream model list.
///
/// Compiled into the binary and used as the second stage of the fallback chain
/// when the live API is unreachable. Refreshed with `llm-registry fetch --output data/models-snapshot.json`.
pub const EMBEDDED_SNAPSHOT: &str = include_str!("../../data/models-snapshot.json");
