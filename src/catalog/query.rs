//! Declarative filtering, sorting and lookup over normalized models.
//!
//! Queries never mutate their input: results are fresh vectors of cloned
//! models, so the same input always yields the same output.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::model::{NormalizedModel, SizeTier};

/// A single value or a set of values for a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<String> for OneOrMany<String> {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<SizeTier> for OneOrMany<SizeTier> {
    fn from(value: SizeTier) -> Self {
        OneOrMany::One(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Context window size
    Context,
    /// Prompt price per million tokens
    Price,
    /// Display name
    Name,
    /// Provider display name
    Provider,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filter, sort and limit options. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Provider identifier or display name, case-insensitive
    pub provider: Option<OneOrMany<String>>,

    /// Inclusive minimum context length
    pub min_context: Option<u64>,

    /// Inclusive maximum context length
    pub max_context: Option<u64>,

    pub tier: Option<OneOrMany<SizeTier>>,

    /// Keep only models whose free flag equals this value
    pub free: Option<bool>,

    /// Keep only models whose image-input flag equals this value
    pub supports_images: Option<bool>,

    /// Case-insensitive substring over id, name, provider name and description
    pub search: Option<String>,

    pub sort_by: Option<SortKey>,

    pub sort_order: SortOrder,

    /// Maximum number of results, taken from the front
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: impl Into<OneOrMany<String>>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn min_context(mut self, min: u64) -> Self {
        self.min_context = Some(min);
        self
    }

    pub fn max_context(mut self, max: u64) -> Self {
        self.max_context = Some(max);
        self
    }

    pub fn tier(mut self, tier: impl Into<OneOrMany<SizeTier>>) -> Self {
        self.tier = Some(tier.into());
        self
    }

    pub fn free(mut self, free: bool) -> Self {
        self.free = Some(free);
        self
    }

    pub fn supports_images(mut self, supports_images: bool) -> Self {
        self.supports_images = Some(supports_images);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_by = Some(key);
        self.sort_order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filter, sort and truncate a model list according to `options`.
pub fn query(models: &[NormalizedModel], options: &QueryOptions) -> Vec<NormalizedModel> {
    let mut working: Vec<&NormalizedModel> = models.iter().collect();

    if let Some(providers) = &options.provider {
        let wanted: Vec<String> = providers
            .as_slice()
            .iter()
            .map(|p| p.trim().to_lowercase())
            .collect();
        working.retain(|m| {
            let id = m.provider.id.to_lowercase();
            let name = m.provider.name.to_lowercase();
            wanted.iter().any(|w| *w == id || *w == name)
        });
    }

    if let Some(min) = options.min_context {
        working.retain(|m| m.context_length >= min);
    }

    if let Some(max) = options.max_context {
        working.retain(|m| m.context_length <= max);
    }

    if let Some(tiers) = &options.tier {
        let tiers = tiers.as_slice();
        working.retain(|m| tiers.contains(&m.size_tier));
    }

    if let Some(free) = options.free {
        working.retain(|m| m.pricing.is_free == free);
    }

    if let Some(images) = options.supports_images {
        working.retain(|m| m.supports_images() == images);
    }

    if let Some(search) = options.search.as_deref().map(str::trim)
        && !search.is_empty()
    {
        let needle = search.to_lowercase();
        working.retain(|m| matches_search(m, &needle));
    }

    if let Some(key) = options.sort_by {
        // `sort_by` is stable and the comparator is reversed for descending
        // order, so ties keep their input order in both directions.
        working.sort_by(|a, b| {
            let ordering = compare_by(key, a, b);
            match options.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    if let Some(limit) = options.limit {
        working.truncate(limit);
    }

    working.into_iter().cloned().collect()
}

fn matches_search(model: &NormalizedModel, needle: &str) -> bool {
    model.id.to_lowercase().contains(needle)
        || model.name.to_lowercase().contains(needle)
        || model.provider.name.to_lowercase().contains(needle)
        || model
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

fn compare_by(key: SortKey, a: &NormalizedModel, b: &NormalizedModel) -> Ordering {
    match key {
        SortKey::Context => a.context_length.cmp(&b.context_length),
        SortKey::Price => a
            .pricing
            .prompt_per_million
            .total_cmp(&b.pricing.prompt_per_million),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Provider => a
            .provider
            .name
            .to_lowercase()
            .cmp(&b.provider.name.to_lowercase()),
    }
}

/// Resolve a loosely-typed model reference to a model.
///
/// Passes run in order and the first match wins: exact identifier, exact
/// slug, identifier ending in `/query`, display name containing the query,
/// then a punctuation-insensitive match against identifier, slug or name.
/// All comparisons are case-insensitive on a trimmed query.
pub fn find_model<'a>(query: &str, models: &'a [NormalizedModel]) -> Option<&'a NormalizedModel> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let suffix = format!("/{query}");
    let fuzzy_query = fuzzy_key(&query);

    models
        .iter()
        .find(|m| m.id.to_lowercase() == query)
        .or_else(|| models.iter().find(|m| m.slug.to_lowercase() == query))
        .or_else(|| models.iter().find(|m| m.id.to_lowercase().ends_with(&suffix)))
        .or_else(|| models.iter().find(|m| m.name.to_lowercase().contains(&query)))
        .or_else(|| {
            if fuzzy_query.is_empty() {
                return None;
            }
            models.iter().find(|m| {
                [&m.id, &m.slug, &m.name]
                    .into_iter()
                    .any(|field| fuzzy_key(field) == fuzzy_query)
            })
        })
}

/// Lowercase and strip `-`, `.` and spaces.
fn fuzzy_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '.' | ' '))
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::catalog::{
        normalize::normalize_all,
        registry::{SourceTag, assemble},
        types::RawModel,
    };

    fn registry_models(value: serde_json::Value) -> Vec<NormalizedModel> {
        let raws: Vec<RawModel> = serde_json::from_value(value).unwrap();
        assemble(normalize_all(&raws), SourceTag::Api)
            .models()
            .to_vec()
    }

    fn five_models() -> Vec<NormalizedModel> {
        registry_models(json!([
            {"id": "a/tiny", "name": "Tiny", "context_length": 4000,
             "pricing": {"prompt": "0", "completion": "0"}},
            {"id": "b/small", "name": "Small", "context_length": 16000,
             "pricing": {"prompt": "0.000001", "completion": "0.000002"}},
            {"id": "openai/medium", "name": "Medium", "context_length": 40000,
             "description": "A balanced model",
             "pricing": {"prompt": "0.000005", "completion": "0.00001"}},
            {"id": "anthropic/large", "name": "Large", "context_length": 200000,
             "architecture": {"input_modalities": ["text", "image"]},
             "pricing": {"prompt": "0.000003", "completion": "0.000015"}},
            {"id": "google/massive", "name": "Massive", "context_length": 1000000,
             "architecture": {"modality": "text+image->text"},
             "pricing": {"prompt": "0", "completion": "0"}}
        ]))
    }

    fn ids(models: &[NormalizedModel]) -> Vec<&str> {
        models.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_min_context_preserves_order() {
        let models = five_models();
        let result = query(&models, &QueryOptions::new().min_context(32000));
        let contexts: Vec<u64> = result.iter().map(|m| m.context_length).collect();
        assert_eq!(contexts, vec![1000000, 200000, 40000]);
    }

    #[test]
    fn test_context_bounds_inclusive() {
        let models = five_models();
        let result = query(
            &models,
            &QueryOptions::new().min_context(16000).max_context(200000),
        );
        assert_eq!(ids(&result), vec!["anthropic/large", "openai/medium", "b/small"]);
    }

    #[test]
    fn test_provider_filter_matches_id_or_name() {
        let models = five_models();
        let by_name = query(&models, &QueryOptions::new().provider("ANTHROPIC".to_string()));
        assert_eq!(ids(&by_name), vec!["anthropic/large"]);

        let many = query(
            &models,
            &QueryOptions::new().provider(vec!["Google".to_string(), "openai".to_string()]),
        );
        assert_eq!(ids(&many), vec!["google/massive", "openai/medium"]);
    }

    #[test]
    fn test_tier_filter() {
        let models = five_models();
        let result = query(
            &models,
            &QueryOptions::new().tier(vec![SizeTier::Tiny, SizeTier::Massive]),
        );
        assert_eq!(ids(&result), vec!["google/massive", "a/tiny"]);
    }

    #[rstest]
    #[case(true, vec!["google/massive", "a/tiny"])]
    #[case(false, vec!["anthropic/large", "openai/medium", "b/small"])]
    fn test_free_filter_exact_equality(#[case] free: bool, #[case] expected: Vec<&str>) {
        let models = five_models();
        let result = query(&models, &QueryOptions::new().free(free));
        assert_eq!(ids(&result), expected);
    }

    #[test]
    fn test_image_filter() {
        let models = five_models();
        let result = query(&models, &QueryOptions::new().supports_images(true));
        assert_eq!(ids(&result), vec!["google/massive", "anthropic/large"]);
        let result = query(&models, &QueryOptions::new().supports_images(false));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_search_covers_description_and_provider() {
        let models = five_models();
        let result = query(&models, &QueryOptions::new().search("BALANCED"));
        assert_eq!(ids(&result), vec!["openai/medium"]);

        let result = query(&models, &QueryOptions::new().search("anthropic"));
        assert_eq!(ids(&result), vec!["anthropic/large"]);

        let result = query(&models, &QueryOptions::new().search("   "));
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_sort_and_limit() {
        let models = five_models();
        let result = query(
            &models,
            &QueryOptions::new().sort(SortKey::Price, SortOrder::Desc).limit(2),
        );
        assert_eq!(ids(&result), vec!["openai/medium", "anthropic/large"]);

        let result = query(&models, &QueryOptions::new().sort(SortKey::Name, SortOrder::Asc));
        assert_eq!(
            ids(&result),
            vec!["anthropic/large", "google/massive", "openai/medium", "b/small", "a/tiny"]
        );

        let result = query(&models, &QueryOptions::new().sort(SortKey::Context, SortOrder::Asc));
        assert_eq!(result.first().unwrap().context_length, 4000);
    }

    #[test]
    fn test_desc_sort_keeps_ties_in_input_order() {
        let models = five_models();
        let result = query(&models, &QueryOptions::new().sort(SortKey::Price, SortOrder::Desc));
        // Both free models tie at zero and stay in registry order.
        assert_eq!(ids(&result)[3..], ["google/massive", "a/tiny"]);
    }

    #[test]
    fn test_query_is_idempotent_and_non_mutating() {
        let models = five_models();
        let before = models.clone();
        let options = QueryOptions::new()
            .sort(SortKey::Name, SortOrder::Desc)
            .min_context(5000);
        let first = query(&models, &options);
        let second = query(&models, &options);
        assert_eq!(first, second);
        assert_eq!(models, before);
    }

    #[test]
    fn test_options_deserialize_one_or_many() {
        let options: QueryOptions =
            serde_json::from_str(r#"{"provider": "openai", "tier": ["large", "massive"]}"#)
                .unwrap();
        assert_eq!(options.provider, Some(OneOrMany::One("openai".to_string())));
        assert_eq!(
            options.tier,
            Some(OneOrMany::Many(vec![SizeTier::Large, SizeTier::Massive]))
        );
    }

    fn lookup_models() -> Vec<NormalizedModel> {
        registry_models(json!([
            {"id": "openai/gpt-4o", "name": "OpenAI: GPT-4o", "context_length": 128000},
            {"id": "openai/gpt-4o-mini", "name": "OpenAI: GPT-4o-mini", "context_length": 128000},
            {"id": "anthropic/claude-3.5-sonnet", "name": "Anthropic: Claude 3.5 Sonnet", "context_length": 200000},
            {"id": "meta-llama/llama-3.1-70b-instruct", "name": "Meta: Llama 3.1 70B Instruct", "context_length": 131072}
        ]))
    }

    #[rstest]
    #[case("openai/gpt-4o", "openai/gpt-4o")]
    #[case("  OpenAI/GPT-4o-Mini ", "openai/gpt-4o-mini")]
    #[case("gpt-4o", "openai/gpt-4o")]
    #[case("claude 3.5 sonnet", "anthropic/claude-3.5-sonnet")]
    #[case("gpt4o", "openai/gpt-4o")]
    #[case("claude35sonnet", "anthropic/claude-3.5-sonnet")]
    #[case("llama-3.1-70b-instruct", "meta-llama/llama-3.1-70b-instruct")]
    fn test_find_model(#[case] needle: &str, #[case] expected: &str) {
        let models = lookup_models();
        assert_eq!(find_model(needle, &models).unwrap().id, expected);
    }

    #[test]
    fn test_find_model_misses() {
        let models = lookup_models();
        assert!(find_model("", &models).is_none());
        assert!(find_model("---", &models).is_none());
        assert!(find_model("gemini", &models).is_none());
    }
}
