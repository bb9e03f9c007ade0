//! Hand-maintained fallback models.
//!
//! This is the terminal stage of the fallback chain: already-normalized
//! records covering the major providers, built without parsing or I/O.

use chrono::Utc;

use super::{
    model::{
        DefaultParameters, LegacyModality, Modality, ModelCapabilities, ModelPricing,
        NormalizedModel, SizeTier, SupportedParameter,
    },
    normalize::split_identifier,
    providers::lookup_provider,
};

struct Entry {
    id: &'static str,
    name: &'static str,
    context_length: u64,
    max_completion_tokens: u64,
    prompt_per_million: f64,
    completion_per_million: f64,
    vision: bool,
    tools: bool,
    reasoning: bool,
}

const MODELS: &[Entry] = &[
    Entry {
        id: "openai/gpt-4o",
        name: "OpenAI: GPT-4o",
        context_length: 128_000,
        max_completion_tokens: 16_384,
        prompt_per_million: 2.5,
        completion_per_million: 10.0,
        vision: true,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "openai/gpt-4o-mini",
        name: "OpenAI: GPT-4o-mini",
        context_length: 128_000,
        max_completion_tokens: 16_384,
        prompt_per_million: 0.15,
        completion_per_million: 0.6,
        vision: true,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "openai/o3-mini",
        name: "OpenAI: o3 Mini",
        context_length: 200_000,
        max_completion_tokens: 100_000,
        prompt_per_million: 1.1,
        completion_per_million: 4.4,
        vision: false,
        tools: true,
        reasoning: true,
    },
    Entry {
        id: "anthropic/claude-3.5-sonnet",
        name: "Anthropic: Claude 3.5 Sonnet",
        context_length: 200_000,
        max_completion_tokens: 8_192,
        prompt_per_million: 3.0,
        completion_per_million: 15.0,
        vision: true,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "anthropic/claude-3.5-haiku",
        name: "Anthropic: Claude 3.5 Haiku",
        context_length: 200_000,
        max_completion_tokens: 8_192,
        prompt_per_million: 0.8,
        completion_per_million: 4.0,
        vision: false,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "google/gemini-2.0-flash-001",
        name: "Google: Gemini 2.0 Flash",
        context_length: 1_048_576,
        max_completion_tokens: 8_192,
        prompt_per_million: 0.1,
        completion_per_million: 0.4,
        vision: true,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "google/gemini-pro-1.5",
        name: "Google: Gemini 1.5 Pro",
        context_length: 2_000_000,
        max_completion_tokens: 8_192,
        prompt_per_million: 1.25,
        completion_per_million: 5.0,
        vision: true,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "meta-llama/llama-3.1-70b-instruct",
        name: "Meta: Llama 3.1 70B Instruct",
        context_length: 131_072,
        max_completion_tokens: 4_096,
        prompt_per_million: 0.12,
        completion_per_million: 0.3,
        vision: false,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "meta-llama/llama-3.1-8b-instruct:free",
        name: "Meta: Llama 3.1 8B Instruct (free)",
        context_length: 131_072,
        max_completion_tokens: 4_096,
        prompt_per_million: 0.0,
        completion_per_million: 0.0,
        vision: false,
        tools: false,
        reasoning: false,
    },
    Entry {
        id: "mistralai/mistral-large",
        name: "Mistral Large",
        context_length: 128_000,
        max_completion_tokens: 4_096,
        prompt_per_million: 2.0,
        completion_per_million: 6.0,
        vision: false,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "mistralai/mistral-7b-instruct",
        name: "Mistral: Mistral 7B Instruct",
        context_length: 32_768,
        max_completion_tokens: 4_096,
        prompt_per_million: 0.03,
        completion_per_million: 0.055,
        vision: false,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "deepseek/deepseek-chat",
        name: "DeepSeek: DeepSeek V3",
        context_length: 64_000,
        max_completion_tokens: 8_192,
        prompt_per_million: 0.27,
        completion_per_million: 1.1,
        vision: false,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "deepseek/deepseek-r1",
        name: "DeepSeek: R1",
        context_length: 64_000,
        max_completion_tokens: 8_192,
        prompt_per_million: 0.55,
        completion_per_million: 2.19,
        vision: false,
        tools: false,
        reasoning: true,
    },
    Entry {
        id: "x-ai/grok-2-1212",
        name: "xAI: Grok 2 1212",
        context_length: 131_072,
        max_completion_tokens: 4_096,
        prompt_per_million: 2.0,
        completion_per_million: 10.0,
        vision: false,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "cohere/command-r-plus",
        name: "Cohere: Command R+",
        context_length: 128_000,
        max_completion_tokens: 4_000,
        prompt_per_million: 2.5,
        completion_per_million: 10.0,
        vision: false,
        tools: true,
        reasoning: false,
    },
    Entry {
        id: "qwen/qwen-2.5-72b-instruct",
        name: "Qwen2.5 72B Instruct",
        context_length: 32_768,
        max_completion_tokens: 8_192,
        prompt_per_million: 0.13,
        completion_per_million: 0.4,
        vision: false,
        tools: true,
        reasoning: false,
    },
];

/// Build the hardcoded model list. Never empty.
pub fn fallback_models() -> Vec<NormalizedModel> {
    let now = Utc::now();
    MODELS
        .iter()
        .map(|entry| {
            let (provider_id, slug) = split_identifier(entry.id);

            let mut supported_parameters = vec![
                SupportedParameter::MaxTokens,
                SupportedParameter::Temperature,
                SupportedParameter::TopP,
                SupportedParameter::Stop,
            ];
            if entry.tools {
                supported_parameters.push(SupportedParameter::Tools);
                supported_parameters.push(SupportedParameter::ToolChoice);
            }
            if entry.reasoning {
                supported_parameters.push(SupportedParameter::Reasoning);
                supported_parameters.push(SupportedParameter::IncludeReasoning);
            }

            let input_modalities = if entry.vision {
                vec![Modality::Text, Modality::Image]
            } else {
                vec![Modality::Text]
            };

            NormalizedModel {
                id: entry.id.to_string(),
                slug: slug.to_string(),
                canonical_slug: None,
                name: entry.name.to_string(),
                description: None,
                provider: lookup_provider(provider_id),
                context_length: entry.context_length,
                max_completion_tokens: entry.max_completion_tokens,
                size_tier: SizeTier::from_context_length(entry.context_length),
                pricing: ModelPricing {
                    prompt_per_million: entry.prompt_per_million,
                    completion_per_million: entry.completion_per_million,
                    is_free: entry.prompt_per_million == 0.0 && entry.completion_per_million == 0.0,
                    ..Default::default()
                },
                capabilities: ModelCapabilities {
                    input_modalities,
                    output_modalities: vec![Modality::Text],
                    tools: entry.tools,
                    reasoning: entry.reasoning,
                    temperature: true,
                    top_p: true,
                    stop_sequences: true,
                    vision: entry.vision,
                    modality: if entry.vision {
                        LegacyModality::TextImage
                    } else {
                        LegacyModality::Text
                    },
                    ..Default::default()
                },
                supported_parameters,
                default_parameters: DefaultParameters::default(),
                per_request_limits: None,
                tokenizer: None,
                instruct_type: None,
                hugging_face_id: None,
                created_at: None,
                last_updated: now,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_fallback_models_non_empty_and_unique() {
        let models = fallback_models();
        assert!(models.len() >= 10);
        let ids: HashSet<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), models.len());
    }

    #[test]
    fn test_fallback_models_cover_major_providers() {
        let models = fallback_models();
        for provider in ["openai", "anthropic", "google", "meta-llama", "mistralai"] {
            assert!(
                models.iter().any(|m| m.provider.id == provider),
                "missing fallback models for {provider}"
            );
        }
        assert!(models.iter().all(|m| !m.provider.name.is_empty()));
    }

    #[test]
    fn test_fallback_models_are_consistent() {
        for model in fallback_models() {
            assert_eq!(
                model.size_tier,
                SizeTier::from_context_length(model.context_length)
            );
            assert!(model.max_completion_tokens <= model.context_length);
            assert_eq!(model.capabilities.vision, model.supports_images());
            assert!(model.id.ends_with(&model.slug));
        }
        let free = fallback_models().into_iter().filter(|m| m.is_free()).count();
        assert_eq!(free, 1);
    }
}
