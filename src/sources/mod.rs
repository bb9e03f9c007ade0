//! Catalog sources and the fallback chain that tries them in order.
//!
//! A [`CatalogSource`] produces raw upstream records. The [`FallbackChain`]
//! runs its sources strictly one after another, normalizes and assembles the
//! first successful result, and falls back to the hardcoded model list when
//! every source fails.

mod api;
mod chain;
mod error;
mod snapshot;

pub use api::ApiSource;
use async_trait::async_trait;
#[cfg(test)]
pub(crate) use chain::test_support;
pub use chain::{FallbackChain, FetchReport, StageFailure};
pub use error::SourceError;
use serde::Deserialize;
use serde_json::Value;
pub use snapshot::{SnapshotLocation, SnapshotSource};

use crate::catalog::{RawModel, SourceTag};

/// A stage of the fallback chain that yields raw upstream records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Source label stamped on a registry built from this stage's output.
    fn tag(&self) -> SourceTag;

    /// Retrieve and shape-validate raw records.
    async fn fetch_raw(&self) -> Result<Vec<RawModel>, SourceError>;
}

/// Parse and shape-validate a `{ "data": [...] }` model list.
///
/// The envelope must be an object whose `data` field is a list. Elements
/// that fail typed decoding are salvaged to an identity-only record when they
/// carry a string `id`, and skipped otherwise. A list that yields no usable
/// records is treated as a shape failure.
pub fn parse_model_list(body: &str) -> Result<Vec<RawModel>, SourceError> {
    let envelope: Value = serde_json::from_str(body)?;

    let items = match envelope.get("data") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(SourceError::Shape(format!(
                "`data` must be a list, got {}",
                json_type_name(other)
            )));
        }
        None => {
            return Err(SourceError::Shape(format!(
                "expected an object with a `data` list, got {}",
                json_type_name(&envelope)
            )));
        }
    };

    let mut models = Vec::with_capacity(items.len());
    let mut salvaged = 0usize;
    let mut skipped = 0usize;

    for (index, item) in items.iter().enumerate() {
        match RawModel::deserialize(item) {
            Ok(model) if !model.id.trim().is_empty() => models.push(model),
            Ok(_) => {
                skipped += 1;
                tracing::warn!(index, "Skipping model record with empty id");
            }
            Err(e) => match RawModel::salvage(item) {
                Some(model) => {
                    salvaged += 1;
                    tracing::warn!(
                        index,
                        model_id = %model.id,
                        error = %e,
                        "Model record failed to decode, dropping undecodable fields"
                    );
                    models.push(model);
                }
                None => {
                    skipped += 1;
                    tracing::warn!(index, error = %e, "Skipping model record without an id");
                }
            },
        }
    }

    if salvaged > 0 || skipped > 0 {
        tracing::debug!(
            total = items.len(),
            salvaged,
            skipped,
            "Model list contained malformed records"
        );
    }

    if models.is_empty() {
        return Err(SourceError::Shape("model list contains no usable records".into()));
    }

    Ok(models)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_list() {
        let models = parse_model_list(
            r#"{"data": [
                {"id": "openai/gpt-4o", "name": "GPT-4o", "context_length": 128000},
                {"id": "anthropic/claude-3.5-sonnet", "context_length": "200000"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "openai/gpt-4o");
        assert_eq!(models[1].context_length, Some(200_000));
    }

    #[test]
    fn test_parse_rejects_missing_data() {
        let err = parse_model_list(r#"{"models": []}"#).unwrap_err();
        assert!(matches!(err, SourceError::Shape(_)));

        let err = parse_model_list(r#"[{"id": "a/b"}]"#).unwrap_err();
        assert!(matches!(err, SourceError::Shape(msg) if msg.contains("a list")));
    }

    #[test]
    fn test_parse_rejects_non_list_data() {
        let err = parse_model_list(r#"{"data": {"id": "a/b"}}"#).unwrap_err();
        assert!(matches!(err, SourceError::Shape(msg) if msg.contains("an object")));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = parse_model_list("<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }

    #[test]
    fn test_parse_rejects_empty_list() {
        let err = parse_model_list(r#"{"data": []}"#).unwrap_err();
        assert!(matches!(err, SourceError::Shape(_)));
    }

    #[test]
    fn test_parse_salvages_and_skips_malformed_records() {
        let models = parse_model_list(
            r#"{"data": [
                {"id": "openai/gpt-4o", "context_length": 128000},
                {"id": "broken/model", "name": "Broken", "architecture": "not-an-object"},
                {"name": "no id at all"},
                {"id": 42},
                "just a string",
                {"id": "   "}
            ]}"#,
        )
        .unwrap();

        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["openai/gpt-4o", "broken/model"]);
        assert_eq!(models[1].name, "Broken");
        assert!(models[1].architecture.is_none());
        assert!(models[1].context_length.is_none());
    }

    #[test]
    fn test_bad_optional_field_keeps_context_and_prices() {
        let models = parse_model_list(
            r#"{"data": [
                {"id": "openai/gpt-4o", "name": null, "context_length": 128000,
                 "pricing": {"prompt": "0.0000025", "completion": "0.00001"},
                 "top_provider": {"is_moderated": "false"}}
            ]}"#,
        )
        .unwrap();

        let model = crate::catalog::normalize(&models[0]);
        assert_eq!(model.context_length, 128000);
        assert_eq!(model.size_tier, crate::catalog::SizeTier::Large);
        assert_eq!(model.pricing.prompt_per_million, 2.5);
        assert_eq!(model.pricing.completion_per_million, 10.0);
        assert!(!model.pricing.is_free);
        assert!(!model.capabilities.moderated);
        assert_eq!(model.name, "openai/gpt-4o");
    }
}
