//! Type definitions for the upstream aggregator's model list.
//!
//! The upstream endpoint returns `{ "data": [ ... ] }` where every element is a
//! loosely-typed model record. Only `id` is load-bearing. Every other field
//! degrades to absent on its own when it has the wrong shape, so one bad field
//! never costs a record its pricing or context. Numeric fields are accepted in
//! whatever shape the upstream happens to emit (numbers, numeric strings, `null`).

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, DeserializeOwned, Visitor},
};
use serde_json::Value;

/// Envelope returned by the upstream list endpoint and stored in the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawModelList {
    pub data: Vec<RawModel>,
}

/// A single upstream model record (untrusted).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawModel {
    /// Identifier in `provider/slug` form (e.g., "anthropic/claude-3.5-sonnet")
    pub id: String,

    /// Human-readable model name
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub description: Option<String>,

    /// Context window size (tokens)
    #[serde(default, deserialize_with = "deserialize_count")]
    pub context_length: Option<u64>,

    /// Explicit maximum output tokens, when the upstream reports one at the top level
    #[serde(
        default,
        alias = "max_output_tokens",
        deserialize_with = "deserialize_count"
    )]
    pub max_completion_tokens: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub architecture: Option<RawArchitecture>,

    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub pricing: RawPricing,

    /// Override block from the highest-ranked serving provider
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub top_provider: Option<RawTopProvider>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub per_request_limits: Option<RawPerRequestLimits>,

    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub supported_parameters: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub default_parameters: Option<RawDefaultParameters>,

    /// Creation time (epoch seconds)
    #[serde(default, deserialize_with = "deserialize_count")]
    pub created: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub canonical_slug: Option<String>,

    /// External model repository identifier (e.g., a Hugging Face repo)
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub hugging_face_id: Option<String>,
}

impl RawModel {
    /// Rebuild a record that failed typed decoding, keeping every field that
    /// decodes on its own next to the identifier and dropping the rest.
    /// Returns `None` when the element has no usable string `id`.
    pub fn salvage(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let id = fields.get("id")?.as_str()?.trim();
        if id.is_empty() {
            return None;
        }

        let mut kept = serde_json::Map::new();
        kept.insert("id".to_string(), Value::String(id.to_string()));
        for (key, field) in fields {
            if key == "id" {
                continue;
            }
            let mut candidate = kept.clone();
            candidate.insert(key.clone(), field.clone());
            if Self::deserialize(&Value::Object(candidate)).is_ok() {
                kept.insert(key.clone(), field.clone());
            }
        }

        Self::deserialize(&Value::Object(kept)).ok()
    }
}

/// Architecture block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawArchitecture {
    /// Legacy modality string (e.g., "text+image->text")
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub modality: Option<String>,

    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub input_modalities: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub output_modalities: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub tokenizer: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub instruct_type: Option<String>,
}

/// Pricing block. Costs are per-token decimal strings (e.g., "0.000003").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPricing {
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub prompt: Option<String>,

    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub completion: Option<String>,

    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub request: Option<String>,

    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub image: Option<String>,

    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub web_search: Option<String>,

    #[serde(
        default,
        alias = "reasoning",
        deserialize_with = "deserialize_decimal"
    )]
    pub internal_reasoning: Option<String>,

    #[serde(
        default,
        alias = "cache_read",
        deserialize_with = "deserialize_decimal"
    )]
    pub input_cache_read: Option<String>,

    #[serde(
        default,
        alias = "cache_write",
        deserialize_with = "deserialize_decimal"
    )]
    pub input_cache_write: Option<String>,
}

/// Override block reported for the top-ranked serving provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTopProvider {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub context_length: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub max_completion_tokens: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_moderated: Option<bool>,
}

/// Per-request token limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPerRequestLimits {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub prompt_tokens: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub completion_tokens: Option<u64>,
}

/// Default sampling parameters suggested by the upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDefaultParameters {
    #[serde(default, deserialize_with = "deserialize_number")]
    pub temperature: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_number")]
    pub top_p: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_number")]
    pub top_k: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_number")]
    pub frequency_penalty: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_number")]
    pub presence_penalty: Option<f64>,
}

/// Decodes `T` when the value has the right shape; anything else becomes `None`.
fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| T::deserialize(v).ok()))
}

/// Like [`deserialize_lenient`], falling back to `T::default()`.
fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(deserialize_lenient(deserializer)?.unwrap_or_default())
}

/// Accepts a boolean, `"true"`/`"false"` in any case, or `0`/`1`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::String(s)) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Some(true),
            f if f.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    })
}

/// Accepts a decimal as a JSON string or number; anything else becomes `None`.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a decimal string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.trim().to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.is_finite().then(|| v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(self)
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }

    deserializer.deserialize_any(DecimalVisitor)
}

/// Accepts a non-negative count as an integer, float or numeric string.
/// Negative, non-finite and non-numeric values become `None`.
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = deserialize_number(deserializer)?;
    Ok(number.filter(|n| *n >= 0.0).map(|n| n.trunc() as u64))
}

/// Accepts a number or numeric string; anything else becomes `None`.
fn deserialize_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.is_finite().then_some(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().parse::<f64>().ok().filter(|n| n.is_finite()))
        }

        fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(self)
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

/// Accepts a list of strings, dropping non-string elements. Non-list values become `None`.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}
