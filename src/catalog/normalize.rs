//! Schema normalizer: upstream [`RawModel`] -> [`NormalizedModel`].
//!
//! Normalization is total. Missing or malformed optional inputs degrade to
//! documented defaults; nothing here returns an error.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use super::{
    model::{
        DefaultParameters, LegacyModality, Modality, ModelCapabilities, ModelPricing,
        NormalizedModel, PerRequestLimits, SizeTier, SupportedParameter,
    },
    providers::{UNKNOWN_PROVIDER_ID, lookup_provider},
    types::{RawArchitecture, RawModel, RawPricing},
};

/// Cap applied when neither the record nor its top provider reports a max output.
pub const DEFAULT_MAX_COMPLETION_TOKENS: u64 = 4096;

const PER_MILLION: i64 = 1_000_000;

/// Normalize a single upstream record, stamping it with the current time.
pub fn normalize(raw: &RawModel) -> NormalizedModel {
    normalize_at(raw, Utc::now())
}

/// Normalize a batch of records with a shared freshness timestamp.
pub fn normalize_all(raws: &[RawModel]) -> Vec<NormalizedModel> {
    let now = Utc::now();
    raws.iter().map(|raw| normalize_at(raw, now)).collect()
}

/// Normalize a single upstream record with an explicit freshness timestamp.
pub fn normalize_at(raw: &RawModel, now: DateTime<Utc>) -> NormalizedModel {
    let id = raw.id.trim().to_string();
    let (provider_id, slug) = split_identifier(&id);
    let provider = lookup_provider(provider_id);

    let top_provider = raw.top_provider.as_ref();
    let context_length = raw
        .context_length
        .or_else(|| top_provider.and_then(|tp| tp.context_length))
        .unwrap_or(0);

    let max_completion_tokens = raw
        .max_completion_tokens
        .filter(|n| *n > 0)
        .or_else(|| {
            top_provider
                .and_then(|tp| tp.max_completion_tokens)
                .filter(|n| *n > 0)
        })
        .unwrap_or_else(|| context_length.min(DEFAULT_MAX_COMPLETION_TOKENS));

    let supported_parameters: Vec<SupportedParameter> = raw
        .supported_parameters
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|name| SupportedParameter::from(name.as_str()))
        .collect();

    let pricing = normalize_pricing(&raw.pricing);
    let moderated = top_provider.and_then(|tp| tp.is_moderated).unwrap_or(false);
    let capabilities = derive_capabilities(
        raw.architecture.as_ref(),
        &supported_parameters,
        &pricing,
        moderated,
    );

    let default_parameters = raw
        .default_parameters
        .as_ref()
        .map(|d| DefaultParameters {
            temperature: d.temperature,
            top_p: d.top_p,
            top_k: d.top_k,
            frequency_penalty: d.frequency_penalty,
            presence_penalty: d.presence_penalty,
        })
        .unwrap_or_default();

    let per_request_limits = raw.per_request_limits.as_ref().map(|l| PerRequestLimits {
        prompt_tokens: l.prompt_tokens,
        completion_tokens: l.completion_tokens,
    });

    let architecture = raw.architecture.as_ref();
    let name = match raw.name.trim() {
        "" => id.clone(),
        name => name.to_string(),
    };

    NormalizedModel {
        slug: slug.to_string(),
        canonical_slug: non_empty(raw.canonical_slug.as_deref()),
        name,
        description: non_empty(raw.description.as_deref()),
        provider,
        context_length,
        max_completion_tokens,
        size_tier: SizeTier::from_context_length(context_length),
        pricing,
        capabilities,
        supported_parameters,
        default_parameters,
        per_request_limits,
        tokenizer: non_empty(architecture.and_then(|a| a.tokenizer.as_deref())),
        instruct_type: non_empty(architecture.and_then(|a| a.instruct_type.as_deref())),
        hugging_face_id: non_empty(raw.hugging_face_id.as_deref()),
        created_at: raw.created.and_then(epoch_to_iso8601),
        last_updated: now,
        id,
    }
}

/// Split `provider/slug`. Identifiers without `/` belong to the unknown provider
/// and use the whole identifier as their slug.
pub fn split_identifier(id: &str) -> (&str, &str) {
    match id.split_once('/') {
        Some((provider, slug)) => (provider, slug),
        None => (UNKNOWN_PROVIDER_ID, id),
    }
}

fn normalize_pricing(raw: &RawPricing) -> ModelPricing {
    let prompt = parse_cost(raw.prompt.as_deref()).unwrap_or(Decimal::ZERO);
    let completion = parse_cost(raw.completion.as_deref()).unwrap_or(Decimal::ZERO);

    let optional = |value: Option<&str>| parse_cost(value).map(per_million);

    ModelPricing {
        prompt_per_million: per_million(prompt),
        completion_per_million: per_million(completion),
        request_per_million: optional(raw.request.as_deref()),
        image_per_million: optional(raw.image.as_deref()),
        web_search_per_million: optional(raw.web_search.as_deref()),
        reasoning_per_million: optional(raw.internal_reasoning.as_deref()),
        cache_read_per_million: optional(raw.input_cache_read.as_deref()),
        cache_write_per_million: optional(raw.input_cache_write.as_deref()),
        is_free: prompt.is_zero() && completion.is_zero(),
    }
}

/// Parse a decimal cost string exactly. Unparseable input yields `None`.
fn parse_cost(value: Option<&str>) -> Option<Decimal> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn per_million(per_unit: Decimal) -> f64 {
    match per_unit.checked_mul(Decimal::from(PER_MILLION)) {
        Some(scaled) => scaled.normalize().to_f64().unwrap_or(0.0),
        None => per_unit.to_f64().unwrap_or(0.0) * PER_MILLION as f64,
    }
}

fn derive_capabilities(
    architecture: Option<&RawArchitecture>,
    params: &[SupportedParameter],
    pricing: &ModelPricing,
    moderated: bool,
) -> ModelCapabilities {
    let input_modalities = input_modalities(architecture);
    let output_modalities = output_modalities(architecture);

    let has = |wanted: &[SupportedParameter]| params.iter().any(|p| wanted.contains(p));

    let vision = input_modalities.contains(&Modality::Image);
    let audio_or_video = input_modalities
        .iter()
        .any(|m| matches!(m, Modality::Audio | Modality::Video));
    let modality = if audio_or_video || (vision && output_modalities.len() > 1) {
        LegacyModality::Multimodal
    } else if vision {
        LegacyModality::TextImage
    } else {
        LegacyModality::Text
    };

    ModelCapabilities {
        tools: has(&[SupportedParameter::Tools, SupportedParameter::ToolChoice]),
        reasoning: has(&[
            SupportedParameter::Reasoning,
            SupportedParameter::IncludeReasoning,
        ]),
        structured_output: has(&[SupportedParameter::StructuredOutputs]),
        json_mode: has(&[SupportedParameter::ResponseFormat]),
        temperature: has(&[SupportedParameter::Temperature]),
        top_p: has(&[SupportedParameter::TopP]),
        top_k: has(&[SupportedParameter::TopK]),
        frequency_penalty: has(&[SupportedParameter::FrequencyPenalty]),
        presence_penalty: has(&[SupportedParameter::PresencePenalty]),
        stop_sequences: has(&[SupportedParameter::Stop]),
        streaming: true,
        web_search: pricing.web_search_per_million.is_some_and(|cost| cost > 0.0),
        vision,
        modality,
        moderated,
        input_modalities,
        output_modalities,
    }
}

fn input_modalities(architecture: Option<&RawArchitecture>) -> Vec<Modality> {
    let explicit = architecture
        .and_then(|a| a.input_modalities.as_deref())
        .map(|names| dedup(names.iter().filter_map(|n| Modality::parse_input(n))))
        .filter(|modalities| !modalities.is_empty());
    if let Some(modalities) = explicit {
        return modalities;
    }

    let legacy = architecture
        .and_then(|a| a.modality.as_deref())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mut modalities = vec![Modality::Text];
    for (needle, modality) in [
        ("image", Modality::Image),
        ("audio", Modality::Audio),
        ("video", Modality::Video),
    ] {
        if legacy.contains(needle) {
            modalities.push(modality);
        }
    }
    modalities
}

fn output_modalities(architecture: Option<&RawArchitecture>) -> Vec<Modality> {
    architecture
        .and_then(|a| a.output_modalities.as_deref())
        .map(|names| dedup(names.iter().filter_map(|n| Modality::parse_output(n))))
        .filter(|modalities| !modalities.is_empty())
        .unwrap_or_else(|| vec![Modality::Text])
}

fn dedup(modalities: impl Iterator<Item = Modality>) -> Vec<Modality> {
    let mut out = Vec::new();
    for modality in modalities {
        if !out.contains(&modality) {
            out.push(modality);
        }
    }
    out
}

fn epoch_to_iso8601(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
