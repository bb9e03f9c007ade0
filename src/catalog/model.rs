//! Normalized (trusted) model records.
//!
//! A [`NormalizedModel`] is the stable internal schema every consumer of the
//! registry sees. It is produced by [`normalize`](super::normalize) from an
//! upstream record, or constructed directly by the hardcoded fallback list.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Provider branding, embedded by value in every model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Provider identifier (e.g., "anthropic", "meta-llama")
    pub id: String,

    /// Human-readable provider name
    pub name: String,

    /// Brand color as a hex string
    pub color: String,

    /// Icon reference, if one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Coarse bucket classifying a model's context window size.
///
/// Boundaries are half-open: a model sits in the tier whose lower bound it
/// reaches exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    /// Under 8K tokens
    Tiny,
    /// 8K up to 32K
    Small,
    /// 32K up to 128K
    Medium,
    /// 128K up to 500K
    Large,
    /// 500K and above
    Massive,
}

impl SizeTier {
    pub const ALL: [SizeTier; 5] = [
        SizeTier::Tiny,
        SizeTier::Small,
        SizeTier::Medium,
        SizeTier::Large,
        SizeTier::Massive,
    ];

    pub fn from_context_length(context_length: u64) -> Self {
        match context_length {
            0..8_000 => SizeTier::Tiny,
            8_000..32_000 => SizeTier::Small,
            32_000..128_000 => SizeTier::Medium,
            128_000..500_000 => SizeTier::Large,
            _ => SizeTier::Massive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTier::Tiny => "tiny",
            SizeTier::Small => "small",
            SizeTier::Medium => "medium",
            SizeTier::Large => "large",
            SizeTier::Massive => "massive",
        }
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SizeTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown size tier: {s}"))
    }
}

/// Pricing normalized to cost per million units (tokens, requests, images).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub prompt_per_million: f64,

    pub completion_per_million: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_per_million: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_per_million: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_search_per_million: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_per_million: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_per_million: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_per_million: Option<f64>,

    /// True iff both prompt and completion per-token costs are exactly zero
    pub is_free: bool,
}

/// Input/output modality vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
    File,
}

impl Modality {
    /// Parse a modality name, accepting only the input vocabulary.
    pub fn parse_input(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Modality::Text),
            "image" => Some(Modality::Image),
            "audio" => Some(Modality::Audio),
            "video" => Some(Modality::Video),
            "file" => Some(Modality::File),
            _ => None,
        }
    }

    /// Parse a modality name, accepting only the output vocabulary.
    pub fn parse_output(s: &str) -> Option<Self> {
        Self::parse_input(s).filter(|m| {
            matches!(m, Modality::Text | Modality::Image | Modality::Audio)
        })
    }
}

/// Legacy tri-state modality classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegacyModality {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "text+image")]
    TextImage,
    #[serde(rename = "multimodal")]
    Multimodal,
}

/// Capabilities derived from modalities, supported parameters and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    pub input_modalities: Vec<Modality>,

    pub output_modalities: Vec<Modality>,

    /// Tool/function calling
    pub tools: bool,

    /// Reasoning/thinking output
    pub reasoning: bool,

    pub structured_output: bool,

    pub json_mode: bool,

    pub temperature: bool,

    pub top_p: bool,

    pub top_k: bool,

    pub frequency_penalty: bool,

    pub presence_penalty: bool,

    pub stop_sequences: bool,

    pub streaming: bool,

    pub web_search: bool,

    /// Accepts image input
    pub vision: bool,

    pub modality: LegacyModality,

    pub moderated: bool,
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            input_modalities: vec![Modality::Text],
            output_modalities: vec![Modality::Text],
            tools: false,
            reasoning: false,
            structured_output: false,
            json_mode: false,
            temperature: false,
            top_p: false,
            top_k: false,
            frequency_penalty: false,
            presence_penalty: false,
            stop_sequences: false,
            streaming: true,
            web_search: false,
            vision: false,
            modality: LegacyModality::Text,
            moderated: false,
        }
    }
}

/// A request parameter the upstream reports as supported.
///
/// Known names map to dedicated variants; anything else is carried verbatim in
/// [`SupportedParameter::Other`] so new upstream parameters are never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SupportedParameter {
    Tools,
    ToolChoice,
    Reasoning,
    IncludeReasoning,
    StructuredOutputs,
    ResponseFormat,
    Temperature,
    TopP,
    TopK,
    MinP,
    TopA,
    FrequencyPenalty,
    PresencePenalty,
    RepetitionPenalty,
    Stop,
    Seed,
    MaxTokens,
    LogitBias,
    Logprobs,
    TopLogprobs,
    WebSearchOptions,
    Other(String),
}

impl SupportedParameter {
    pub fn as_str(&self) -> &str {
        match self {
            SupportedParameter::Tools => "tools",
            SupportedParameter::ToolChoice => "tool_choice",
            SupportedParameter::Reasoning => "reasoning",
            SupportedParameter::IncludeReasoning => "include_reasoning",
            SupportedParameter::StructuredOutputs => "structured_outputs",
            SupportedParameter::ResponseFormat => "response_format",
            SupportedParameter::Temperature => "temperature",
            SupportedParameter::TopP => "top_p",
            SupportedParameter::TopK => "top_k",
            SupportedParameter::MinP => "min_p",
            SupportedParameter::TopA => "top_a",
            SupportedParameter::FrequencyPenalty => "frequency_penalty",
            SupportedParameter::PresencePenalty => "presence_penalty",
            SupportedParameter::RepetitionPenalty => "repetition_penalty",
            SupportedParameter::Stop => "stop",
            SupportedParameter::Seed => "seed",
            SupportedParameter::MaxTokens => "max_tokens",
            SupportedParameter::LogitBias => "logit_bias",
            SupportedParameter::Logprobs => "logprobs",
            SupportedParameter::TopLogprobs => "top_logprobs",
            SupportedParameter::WebSearchOptions => "web_search_options",
            SupportedParameter::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SupportedParameter::Other(_))
    }
}

impl From<&str> for SupportedParameter {
    fn from(s: &str) -> Self {
        match s {
            "tools" => SupportedParameter::Tools,
            "tool_choice" => SupportedParameter::ToolChoice,
            "reasoning" => SupportedParameter::Reasoning,
            "include_reasoning" => SupportedParameter::IncludeReasoning,
            "structured_outputs" => SupportedParameter::StructuredOutputs,
            "response_format" => SupportedParameter::ResponseFormat,
            "temperature" => SupportedParameter::Temperature,
            "top_p" => SupportedParameter::TopP,
            "top_k" => SupportedParameter::TopK,
            "min_p" => SupportedParameter::MinP,
            "top_a" => SupportedParameter::TopA,
            "frequency_penalty" => SupportedParameter::FrequencyPenalty,
            "presence_penalty" => SupportedParameter::PresencePenalty,
            "repetition_penalty" => SupportedParameter::RepetitionPenalty,
            "stop" => SupportedParameter::Stop,
            "seed" => SupportedParameter::Seed,
            "max_tokens" => SupportedParameter::MaxTokens,
            "logit_bias" => SupportedParameter::LogitBias,
            "logprobs" => SupportedParameter::Logprobs,
            "top_logprobs" => SupportedParameter::TopLogprobs,
            "web_search_options" => SupportedParameter::WebSearchOptions,
            other => SupportedParameter::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SupportedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SupportedParameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SupportedParameter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(SupportedParameter::from(name.as_str()))
    }
}

/// Default sampling parameters. Every field is nullable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultParameters {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerRequestLimits {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// A fully normalized model record. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedModel {
    /// Globally unique identifier in `provider/slug` form
    pub id: String,

    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_slug: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub provider: Provider,

    pub context_length: u64,

    pub max_completion_tokens: u64,

    pub size_tier: SizeTier,

    pub pricing: ModelPricing,

    pub capabilities: ModelCapabilities,

    pub supported_parameters: Vec<SupportedParameter>,

    pub default_parameters: DefaultParameters,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_request_limits: Option<PerRequestLimits>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruct_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hugging_face_id: Option<String>,

    /// Creation time as an ISO-8601 string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// When this record was normalized
    pub last_updated: DateTime<Utc>,
}

impl NormalizedModel {
    pub fn supports_images(&self) -> bool {
        self.capabilities.vision
    }

    pub fn is_free(&self) -> bool {
        self.pricing.is_free
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, SizeTier::Tiny)]
    #[case(7_999, SizeTier::Tiny)]
    #[case(8_000, SizeTier::Small)]
    #[case(31_999, SizeTier::Small)]
    #[case(32_000, SizeTier::Medium)]
    #[case(127_999, SizeTier::Medium)]
    #[case(128_000, SizeTier::Large)]
    #[case(499_999, SizeTier::Large)]
    #[case(500_000, SizeTier::Massive)]
    #[case(2_000_000, SizeTier::Massive)]
    fn test_size_tier_boundaries(#[case] context: u64, #[case] expected: SizeTier) {
        assert_eq!(SizeTier::from_context_length(context), expected);
    }

    #[test]
    fn test_size_tier_parse() {
        assert_eq!("Large".parse::<SizeTier>().unwrap(), SizeTier::Large);
        assert!("huge".parse::<SizeTier>().is_err());
        assert_eq!(serde_json::to_string(&SizeTier::Massive).unwrap(), "\"massive\"");
    }

    #[test]
    fn test_supported_parameter_open_set() {
        let params: Vec<SupportedParameter> =
            serde_json::from_str(r#"["tools", "top_k", "verbosity"]"#).unwrap();
        assert_eq!(params[0], SupportedParameter::Tools);
        assert_eq!(params[1], SupportedParameter::TopK);
        assert_eq!(params[2], SupportedParameter::Other("verbosity".into()));
        assert!(!params[2].is_known());

        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"["tools","top_k","verbosity"]"#);
    }

    #[test]
    fn test_modality_vocabularies() {
        assert_eq!(Modality::parse_input("Video"), Some(Modality::Video));
        assert_eq!(Modality::parse_input("pdf"), None);
        assert_eq!(Modality::parse_output("audio"), Some(Modality::Audio));
        assert_eq!(Modality::parse_output("video"), None);
        assert_eq!(Modality::parse_output("file"), None);
    }

    #[test]
    fn test_legacy_modality_serialization() {
        assert_eq!(
            serde_json::to_string(&LegacyModality::TextImage).unwrap(),
            "\"text+image\""
        );
    }
}
